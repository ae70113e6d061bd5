//! Apps bundled with cardkit.
//!
//! [`register_all`] puts every app in an [`AppCatalog`] under the module
//! path its manifest entry uses, and [`demo_manifests`] describes the menu
//! tree that exposes them.

pub mod demo;
pub mod hello_world;
pub mod notepad;
pub mod settings;

use cardkit_core::vfs::{Vfs, join};
use cardkit_core::{App, AppCatalog, Result};

pub use demo::anim_demo::AnimDemo;
pub use demo::keyboard_demo::KeyboardDemo;
pub use demo::sound_demo::SoundDemo;
pub use hello_world::HelloWorld;
pub use notepad::Notepad;
pub use settings::SettingsApp;

/// Register every bundled app.
pub fn register_all(catalog: &mut AppCatalog) {
    catalog.register("hello_world", || Ok(Box::new(HelloWorld::new()) as Box<dyn App>));
    catalog.register("notepad", || Ok(Box::new(Notepad::new()) as Box<dyn App>));
    catalog.register("settings", || Ok(Box::new(SettingsApp::new()) as Box<dyn App>));
    catalog.register("demo/keyboard_demo", || {
        Ok(Box::new(KeyboardDemo::new()) as Box<dyn App>)
    });
    catalog.register("demo/anim_demo", || Ok(Box::new(AnimDemo::new()) as Box<dyn App>));
    catalog.register("demo/sound_demo", || Ok(Box::new(SoundDemo::new()) as Box<dyn App>));
}

/// `(directory relative to the apps root, manifest.json)` for the bundled
/// menu tree. The root manifest lists the launcher too; the scan skips it.
pub fn demo_manifests() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "",
            r#"{
  "launcher": "Launcher",
  "hello_world": "Hello World",
  "notepad": "Notepad",
  "demo": "Demos",
  "settings": "Settings"
}"#,
        ),
        (
            "demo",
            r#"{
  "keyboard_demo": "Keyboard",
  "anim_demo": "Animation",
  "sound_demo": "Sound"
}"#,
        ),
    ]
}

/// Write the bundled manifests under `apps_root`, creating directories as
/// needed.
pub fn install_manifests(vfs: &mut dyn Vfs, apps_root: &str) -> Result<()> {
    for (dir, manifest) in demo_manifests() {
        let dir = if dir.is_empty() {
            apps_root.to_string()
        } else {
            join(apps_root, dir)
        };
        vfs.mkdir(&dir)?;
        vfs.write(&join(&dir, "manifest.json"), manifest.as_bytes())?;
    }
    log::debug!("[apps] installed bundled manifests under {apps_root}");
    Ok(())
}
