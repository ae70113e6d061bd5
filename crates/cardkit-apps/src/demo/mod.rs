//! Apps listed under the "Demos" submenu.

pub mod anim_demo;
pub mod keyboard_demo;
pub mod sound_demo;
