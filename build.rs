fn main() {
    // Only the device build needs the ESP-IDF environment; host tests
    // build with `--no-default-features`.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
