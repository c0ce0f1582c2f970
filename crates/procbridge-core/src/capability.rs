//! # Platform Capability Flags
//!
//! Which OS family this build targets, as a fixed ten-flag record.
//!
//! The flags are decided by `cfg!` at compile time; nothing touches the OS at
//! call time.

use crate::record::{Record, RecordBuilder, Variant};

/// Flag names, in record order.
pub const FLAG_NAMES: [&str; 10] = [
    "POSIX", "WINDOWS", "LINUX", "OSX", "FREEBSD", "OPENBSD", "NETBSD", "BSD", "SUNOS", "AIX",
];

/// OS family flags for one build target
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityFlags
{
    /// Any Unix-like target
    pub posix: bool,
    /// Windows
    pub windows: bool,
    /// Linux (including Android)
    pub linux: bool,
    /// macOS
    pub osx: bool,
    /// FreeBSD
    pub freebsd: bool,
    /// OpenBSD
    pub openbsd: bool,
    /// NetBSD
    pub netbsd: bool,
    /// FreeBSD, OpenBSD or NetBSD
    pub bsd: bool,
    /// Solaris or illumos
    pub sunos: bool,
    /// AIX
    pub aix: bool,
}

impl CapabilityFlags
{
    /// Flags of the target this crate was compiled for.
    pub const CURRENT: Self = Self {
        posix: cfg!(unix),
        windows: cfg!(windows),
        linux: cfg!(any(target_os = "linux", target_os = "android")),
        osx: cfg!(target_os = "macos"),
        freebsd: cfg!(target_os = "freebsd"),
        openbsd: cfg!(target_os = "openbsd"),
        netbsd: cfg!(target_os = "netbsd"),
        bsd: cfg!(any(target_os = "freebsd", target_os = "openbsd", target_os = "netbsd")),
        sunos: cfg!(any(target_os = "solaris", target_os = "illumos")),
        aix: cfg!(target_os = "aix"),
    };

    /// Flag values in [`FLAG_NAMES`] order.
    #[must_use]
    pub const fn as_array(&self) -> [bool; 10]
    {
        [
            self.posix,
            self.windows,
            self.linux,
            self.osx,
            self.freebsd,
            self.openbsd,
            self.netbsd,
            self.bsd,
            self.sunos,
            self.aix,
        ]
    }

    /// Named logical record, one field per flag.
    #[must_use]
    pub fn to_record(&self) -> Record
    {
        FLAG_NAMES
            .iter()
            .zip(self.as_array())
            .fold(RecordBuilder::with_capacity(FLAG_NAMES.len()), |builder, (name, flag)| {
                builder.named(*name, Variant::Logical(flag))
            })
            .build()
    }
}

/// Capability flags of the current build as a record.
#[must_use]
pub fn os_type() -> Record
{
    CapabilityFlags::CURRENT.to_record()
}
