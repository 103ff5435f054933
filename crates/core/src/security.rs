// Exploit-mitigation detection from readelf/nm text output

use std::fmt;

/// RELRO hardening level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relro {
    Full,
    Partial,
    None,
}

impl fmt::Display for Relro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relro::Full => write!(f, "Full"),
            Relro::Partial => write!(f, "Partial"),
            Relro::None => write!(f, "None"),
        }
    }
}

/// Mitigations found in an ELF binary; `None` means the check could not run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityReport {
    pub nx: Option<bool>,
    pub pie: Option<bool>,
    pub stack_canary: Option<bool>,
    pub relro: Option<Relro>,
}

impl SecurityReport {
    /// One `Name: Value` line per mitigation that was checked
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(nx) = self.nx {
            lines.push(format!("NX (No Execute): {}", enabled(nx)));
        }
        if let Some(pie) = self.pie {
            lines.push(format!("PIE: {}", enabled(pie)));
        }
        if let Some(canary) = self.stack_canary {
            lines.push(format!("Stack Canary: {}", enabled(canary)));
        }
        if let Some(relro) = self.relro {
            lines.push(format!("RELRO: {}", relro));
        }
        lines
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

/// NX holds when a GNU_STACK segment exists and is not executable.
pub fn nx_enabled(program_headers: &str) -> bool {
    program_headers
        .lines()
        .find(|line| line.trim_start().starts_with("GNU_STACK"))
        .map(|line| !line.split_whitespace().any(|tok| tok == "RWE"))
        .unwrap_or(false)
}

/// PIE holds when the ELF type is DYN.
pub fn pie_enabled(elf_header: &str) -> bool {
    elf_header
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("Type:"))
        .any(|ty| ty.trim_start().starts_with("DYN"))
}

pub fn canary_enabled(symbols: &str) -> bool {
    symbols.contains("__stack_chk_fail")
}

/// Full RELRO needs the GNU_RELRO segment plus eager binding.
pub fn relro_level(program_headers: &str, dynamic_section: &str) -> Relro {
    let has_relro = program_headers
        .lines()
        .any(|line| line.trim_start().starts_with("GNU_RELRO"));
    if !has_relro {
        return Relro::None;
    }

    let bind_now = dynamic_section.lines().any(|line| {
        line.contains("(BIND_NOW)")
            || (line.contains("(FLAGS") && line.split_whitespace().any(|tok| tok == "BIND_NOW"))
            || (line.contains("(FLAGS_1)") && line.split_whitespace().any(|tok| tok == "NOW"))
    });

    if bind_now {
        Relro::Full
    } else {
        Relro::Partial
    }
}
