fn main() {
    // Host builds (`--no-default-features`) have nothing to link against.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
