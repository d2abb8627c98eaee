// The configuration snapshot the console consumes at power up. The front
// end owns parsing and validation; once the emulation thread starts the
// snapshot is never mutated, so there is no listener machinery here.
use std::str::FromStr;

// Emulation pacing: real time, twice real time, or as fast as the host can
// execute (no frame waits at all).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Speed {
    Normal,
    Double,
    Free,
}

impl FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Speed::Normal),
            "2x" => Ok(Speed::Double),
            "free" => Ok(Speed::Free),
            _ => Err(format!("Unknown speed: {} (expected normal, 2x or free)", s)),
        }
    }
}

// Model selection: auto follows the cartridge header's color flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Auto,
    Color,
    Mono,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Mode::Auto),
            "color" => Ok(Mode::Color),
            "mono" => Ok(Mode::Mono),
            _ => Err(format!("Unknown mode: {} (expected auto, color or mono)", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkKind {
    Socket,
    Pipe,
}

impl FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "socket" => Ok(LinkKind::Socket),
            "pipe" => Ok(LinkKind::Pipe),
            _ => Err(format!("Unknown link type: {} (expected socket or pipe)", s)),
        }
    }
}

#[derive(Clone)]
pub struct LinkConfig {
    pub enable: bool,
    pub master: bool,
    pub kind: LinkKind,
    pub addr: String,
    pub port: u16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { enable: false, master: true, kind: LinkKind::Socket, addr: String::from("127.0.0.1"), port: 8765 }
    }
}

#[derive(Clone)]
pub struct Config {
    pub rom_path: String,
    pub bios_path: Option<String>,
    pub speed: Speed,
    pub mode: Mode,
    pub link: LinkConfig,
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rom_path: String::new(),
            bios_path: None,
            speed: Speed::Normal,
            mode: Mode::Auto,
            link: LinkConfig::default(),
            trace: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_parsing() {
        assert_eq!("2x".parse::<Speed>(), Ok(Speed::Double));
        assert_eq!("free".parse::<Speed>(), Ok(Speed::Free));
        assert_eq!("mono".parse::<Mode>(), Ok(Mode::Mono));
        assert_eq!("socket".parse::<LinkKind>(), Ok(LinkKind::Socket));
        assert!("fast".parse::<Speed>().is_err());
        assert!("dmg".parse::<Mode>().is_err());
    }
}
