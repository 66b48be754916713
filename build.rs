fn main() {
    // The board configuration is baked into the firmware with include_str!.
    println!("cargo:rerun-if-changed=config/board.json");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
