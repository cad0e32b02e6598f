fn main() {
    // The ESP-IDF environment only exists when cross-compiling the firmware;
    // host builds (library tests) skip it.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    println!("cargo:rerun-if-env-changed=FEEDWATCH_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=FEEDWATCH_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=FEEDWATCH_CHANNEL_ID");
    println!("cargo:rerun-if-env-changed=FEEDWATCH_API_KEY");
    println!("cargo:rerun-if-env-changed=FEEDWATCH_QR_PAYLOAD");
}
