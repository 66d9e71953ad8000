fn main() {
    // Only the device build needs the ESP-IDF environment; host builds
    // (tests, simulation) have nothing to generate.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
