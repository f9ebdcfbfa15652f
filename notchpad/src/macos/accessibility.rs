#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
}

/// Global event taps only deliver events once the process is trusted.
pub fn is_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}
