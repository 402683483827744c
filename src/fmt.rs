//! Logging shim: `defmt` on the target, nothing on the host.

#![allow(unused_macros)]

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(target_os = "none")]
        ::defmt::info!($s $(, $x)*);
        #[cfg(not(target_os = "none"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(target_os = "none")]
        ::defmt::warn!($s $(, $x)*);
        #[cfg(not(target_os = "none"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(target_os = "none")]
        ::defmt::debug!($s $(, $x)*);
        #[cfg(not(target_os = "none"))]
        let _ = ($( & $x ),*);
    }};
}
