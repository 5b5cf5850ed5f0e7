#[cfg(feature = "tauri")]
const COMMANDS: &[&str] = &[
    "register",
    "show_toast_notification",
    "show_raw_notification",
];

fn main() {
    #[cfg(feature = "tauri")]
    tauri_plugin::Builder::new(COMMANDS).build();
}
