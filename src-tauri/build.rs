fn main() {
    // Only the desktop shell needs the generated Tauri context.
    #[cfg(feature = "desktop")]
    {
        tauri_build::build();
    }
}
