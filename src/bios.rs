// The internal boot ROM. At power-on it overlays 0000-00FF (the color
// model's larger image additionally overlays 0200-08FF, leaving a window
// for the cartridge header), draws the logo, then writes 0x01 to FF50 to
// map itself out forever.
//
// The image is supplied by the user; when none is configured the console
// starts from the post-boot register state instead and the overlay is
// already unlocked.
use super::model::Model;
use std::path::Path;

const DMG_BIOS_SIZE: usize = 0x100;
const CGB_BIOS_SIZE: usize = 0x900;

pub struct Bios {
    data: Vec<u8>,
    active: bool,
    model: Model,
}

impl Bios {
    pub fn power_up(path: Option<&Path>, model: Model) -> Self {
        let data = match path {
            Some(path) => match std::fs::read(path) {
                Ok(data) => data,
                Err(_) => {
                    rog::println!("Boot image {:?} is not readable", path);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let want = match model {
            Model::Dmg => DMG_BIOS_SIZE,
            Model::Cgb => CGB_BIOS_SIZE,
        };
        if !data.is_empty() && data.len() != want {
            rog::println!("Boot image is {} bytes, expected {}", data.len(), want);
            return Self { data: Vec::new(), active: false, model };
        }
        Self { active: !data.is_empty(), data, model }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn covers(&self, a: u16) -> bool {
        if !self.active {
            return false;
        }
        match a {
            0x0000..=0x00ff => true,
            0x0200..=0x08ff => self.model == Model::Cgb,
            _ => false,
        }
    }

    pub fn read(&self, a: u16) -> u8 {
        self.data[a as usize]
    }

    // FF50: a single write of 0x01 removes the overlay permanently.
    pub fn unlock(&mut self, v: u8) {
        if v == 0x01 {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_is_permanent() {
        let mut bios = Bios { data: vec![0xaa; DMG_BIOS_SIZE], active: true, model: Model::Dmg };
        assert!(bios.covers(0x0000));
        assert!(bios.covers(0x00ff));
        assert!(!bios.covers(0x0100));
        bios.unlock(0x00);
        assert!(bios.covers(0x0000));
        bios.unlock(0x01);
        assert!(!bios.covers(0x0000));
    }

    #[test]
    fn test_cgb_overlay_skips_header_window() {
        let bios = Bios { data: vec![0xaa; CGB_BIOS_SIZE], active: true, model: Model::Cgb };
        assert!(bios.covers(0x0000));
        assert!(!bios.covers(0x0150));
        assert!(bios.covers(0x0200));
        assert!(bios.covers(0x08ff));
        assert!(!bios.covers(0x0900));
    }

    #[test]
    fn test_missing_image_powers_up_unlocked() {
        let bios = Bios::power_up(None, Model::Dmg);
        assert!(!bios.is_active());
    }
}
