// The memory controller: every CPU visible read and write lands here and
// is routed to the component that owns the address. It also executes the
// two DMA engines, owns work and high RAM, and fronts the whole space with
// the boot ROM overlay until that is unlocked.
use super::bios::Bios;
use super::cartridge::{self, Cartridge};
use super::config::{Config, Mode};
use super::debug::{Access, AccessListener};
use super::irq::Irq;
use super::joypad::Joypad;
use super::link::LinkPort;
use super::memory::Memory;
use super::model::Model;
use super::ppu::{Hdma, HdmaMode, Ppu};
use super::serial::Serial;
use super::timer::Timer;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::AtomicU8;
use std::sync::Arc;

// The CGB runs the CPU at twice the rate when switched; the PPU, which is
// tied to the dot clock, does not speed up.
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Speed {
    Normal = 0x01,
    Double = 0x02,
}

pub struct MemoryController {
    pub cartridge: Box<dyn Cartridge>,
    pub ppu: Ppu,
    pub joypad: Joypad,
    pub serial: Serial,
    pub timer: Timer,
    pub model: Model,
    pub speed: Speed,
    pub shift: bool,
    bios: Bios,
    irq: Rc<RefCell<Irq>>,
    inte: u8,
    hdma: Hdma,
    hram: [u8; 0x7f],
    wram: [u8; 0x8000],
    wram_bank: usize,
    listener: RefCell<Option<Box<dyn AccessListener>>>,
}

impl MemoryController {
    pub fn power_up(cfg: &Config, link: Option<LinkPort>, joypad_shadow: Arc<AtomicU8>) -> Self {
        let cartridge = cartridge::power_up(&cfg.rom_path);
        let model = match cfg.mode {
            Mode::Color => Model::Cgb,
            Mode::Mono => Model::Dmg,
            Mode::Auto => match cartridge.read(0x0143) {
                0x80 | 0xc0 => Model::Cgb,
                _ => Model::Dmg,
            },
        };
        rog::debugln!("Emulated model is {:?}", model);
        let bios = Bios::power_up(cfg.bios_path.as_deref().map(Path::new), model);
        let irq = Irq::power_up();
        let mut mc = Self {
            cartridge,
            ppu: Ppu::power_up(model, irq.clone()),
            joypad: Joypad::power_up(irq.clone(), joypad_shadow),
            serial: Serial::power_up(irq.clone(), link),
            timer: Timer::power_up(irq.clone()),
            model,
            speed: Speed::Normal,
            shift: false,
            bios,
            irq,
            inte: 0x00,
            hdma: Hdma::power_up(),
            hram: [0x00; 0x7f],
            wram: [0x00; 0x8000],
            wram_bank: 0x01,
            listener: RefCell::new(None),
        };
        if !mc.bios.is_active() {
            // No boot image: start from the register state the boot ROM
            // leaves behind.
            mc.write(0xff05, 0x00);
            mc.write(0xff06, 0x00);
            mc.write(0xff07, 0x00);
            mc.write(0xff40, 0x91);
            mc.write(0xff42, 0x00);
            mc.write(0xff43, 0x00);
            mc.write(0xff45, 0x00);
            mc.write(0xff47, 0xfc);
            mc.write(0xff48, 0xff);
            mc.write(0xff49, 0xff);
            mc.write(0xff4a, 0x00);
            mc.write(0xff4b, 0x00);
        }
        mc
    }

    pub fn bios_active(&self) -> bool {
        self.bios.is_active()
    }

    pub fn attach_listener(&mut self, listener: Box<dyn AccessListener>) {
        *self.listener.borrow_mut() = Some(listener);
    }

    // Advances everything that runs off the CPU clock. `cycles` is the
    // instruction's cost in clock ticks at the current CPU rate; the
    // return value is the wall-clock dot count the frame pacing counts.
    pub fn step(&mut self, cycles: u32) -> u32 {
        let cpu_divider = self.speed as u32;
        let vram_cycles = self.run_hdma();
        let gpu_cycles = cycles / cpu_divider + vram_cycles;
        let cpu_cycles = cycles + vram_cycles * cpu_divider;
        self.timer.step(cpu_cycles);
        self.ppu.step(gpu_cycles);
        self.serial.step(gpu_cycles);
        self.joypad.poll();
        gpu_cycles
    }

    // FF4D bit 0 arms the switch; the STOP instruction performs it.
    pub fn switch_speed(&mut self) {
        if self.shift {
            self.speed = match self.speed {
                Speed::Double => Speed::Normal,
                Speed::Normal => Speed::Double,
            };
        }
        self.shift = false;
    }

    fn run_hdma(&mut self) -> u32 {
        if !self.hdma.active {
            return 0;
        }
        match self.hdma.mode {
            HdmaMode::Gdma => {
                let len = u32::from(self.hdma.remain) + 1;
                for _ in 0..len {
                    self.run_hdma_block();
                }
                self.hdma.active = false;
                len * 8
            }
            HdmaMode::Hdma => {
                if !self.ppu.h_blank {
                    return 0;
                }
                self.run_hdma_block();
                if self.hdma.remain == 0x7f {
                    self.hdma.active = false;
                }
                8
            }
        }
    }

    // Moves one 0x10 byte block into VRAM.
    fn run_hdma_block(&mut self) {
        let src = self.hdma.src;
        for i in 0..0x10 {
            let b = self.read(src + i);
            self.ppu.dma_write_vram(self.hdma.dst + i, b);
        }
        self.hdma.src += 0x10;
        self.hdma.dst += 0x10;
        if self.hdma.remain == 0 {
            self.hdma.remain = 0x7f;
        } else {
            self.hdma.remain -= 1;
        }
    }

    // FF46: copies 160 bytes from v * 0x100 into OAM in one go.
    fn run_oam_dma(&mut self, v: u8) {
        assert!(v <= 0xf1);
        let base = u16::from(v) << 8;
        for i in 0..0xa0 {
            let b = self.read(base + i);
            self.ppu.dma_write_oam(i, b);
        }
    }

    fn observe(&self, kind: Access, a: u16) {
        if let Some(listener) = self.listener.borrow_mut().as_mut() {
            listener.on_access(kind, a);
        }
    }
}

impl Memory for MemoryController {
    fn read(&self, a: u16) -> u8 {
        self.observe(Access::Read, a);
        if self.bios.covers(a) {
            return self.bios.read(a);
        }
        match a {
            0x0000..=0x7fff => self.cartridge.read(a),
            0x8000..=0x9fff => self.ppu.read(a),
            0xa000..=0xbfff => self.cartridge.read(a),
            0xc000..=0xcfff => self.wram[a as usize - 0xc000],
            0xd000..=0xdfff => self.wram[a as usize - 0xd000 + 0x1000 * self.wram_bank],
            // Echo RAM mirrors C000-DDFF.
            0xe000..=0xefff => self.wram[a as usize - 0xe000],
            0xf000..=0xfdff => self.wram[a as usize - 0xf000 + 0x1000 * self.wram_bank],
            0xfe00..=0xfe9f => self.ppu.read(a),
            0xfea0..=0xfeff => 0xff,
            0xff00 => self.joypad.read(a),
            0xff01..=0xff02 => self.serial.read(a),
            0xff04..=0xff07 => self.timer.read(a),
            0xff0f => self.irq.borrow().data,
            0xff4d => {
                let a = if self.speed == Speed::Double { 0x80 } else { 0x00 };
                let b = if self.shift { 0x01 } else { 0x00 };
                a | b
            }
            0xff40..=0xff45 | 0xff47..=0xff4b | 0xff4f => self.ppu.read(a),
            0xff50 => {
                if self.bios.is_active() {
                    0x00
                } else {
                    0x01
                }
            }
            0xff51..=0xff55 => self.hdma.read(a),
            0xff68..=0xff6b => self.ppu.read(a),
            0xff70 => self.wram_bank as u8,
            0xff80..=0xfffe => self.hram[a as usize - 0xff80],
            0xffff => self.inte,
            _ => 0xff,
        }
    }

    fn write(&mut self, a: u16, v: u8) {
        self.observe(Access::Write, a);
        match a {
            0x0000..=0x7fff => self.cartridge.write(a, v),
            0x8000..=0x9fff => self.ppu.write(a, v),
            0xa000..=0xbfff => self.cartridge.write(a, v),
            0xc000..=0xcfff => self.wram[a as usize - 0xc000] = v,
            0xd000..=0xdfff => self.wram[a as usize - 0xd000 + 0x1000 * self.wram_bank] = v,
            0xe000..=0xefff => self.wram[a as usize - 0xe000] = v,
            0xf000..=0xfdff => self.wram[a as usize - 0xf000 + 0x1000 * self.wram_bank] = v,
            0xfe00..=0xfe9f => self.ppu.write(a, v),
            0xfea0..=0xfeff => {}
            0xff00 => self.joypad.write(a, v),
            0xff01..=0xff02 => self.serial.write(a, v),
            0xff04..=0xff07 => self.timer.write(a, v),
            0xff0f => self.irq.borrow_mut().data = v & 0x1f,
            0xff46 => self.run_oam_dma(v),
            0xff4d => self.shift = v & 0x01 == 0x01,
            0xff40..=0xff45 | 0xff47..=0xff4b | 0xff4f => self.ppu.write(a, v),
            0xff50 => self.bios.unlock(v),
            0xff51..=0xff55 => self.hdma.write(a, v),
            0xff68..=0xff6b => self.ppu.write(a, v),
            0xff70 => {
                self.wram_bank = match v & 0x07 {
                    0x00 => 0x01,
                    n => n as usize,
                };
            }
            0xff80..=0xfffe => self.hram[a as usize - 0xff80] = v,
            0xffff => self.inte = v & 0x1f,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU8;
    use std::sync::Mutex;

    fn controller() -> MemoryController {
        // No cartridge in the slot; everything else behaves normally.
        MemoryController::power_up(&Config::default(), None, Arc::new(AtomicU8::new(0)))
    }

    #[test]
    fn test_echo_ram_mirrors_wram() {
        let mut mc = controller();
        mc.write(0xc123, 0x55);
        assert_eq!(mc.read(0xe123), 0x55);
        mc.write(0xfdff, 0xaa);
        assert_eq!(mc.read(0xddff), 0xaa);
    }

    #[test]
    fn test_unusable_region() {
        let mut mc = controller();
        mc.write(0xfea0, 0x12);
        assert_eq!(mc.read(0xfea0), 0xff);
    }

    #[test]
    fn test_wram_banking() {
        let mut mc = controller();
        mc.write(0xff70, 0x02);
        mc.write(0xd000, 0x22);
        mc.write(0xff70, 0x03);
        mc.write(0xd000, 0x33);
        mc.write(0xff70, 0x02);
        assert_eq!(mc.read(0xd000), 0x22);
        // Bank zero aliases bank one.
        mc.write(0xff70, 0x00);
        assert_eq!(mc.read(0xff70), 0x01);
    }

    #[test]
    fn test_interrupt_registers_mask_to_five_bits() {
        let mut mc = controller();
        mc.write(0xffff, 0xff);
        assert_eq!(mc.read(0xffff), 0x1f);
        mc.write(0xff0f, 0xe3);
        assert_eq!(mc.read(0xff0f), 0x03);
    }

    #[test]
    fn test_oam_dma_copies_from_wram() {
        let mut mc = controller();
        for i in 0..0xa0u16 {
            mc.write(0xc000 + i, i as u8);
        }
        // The LCD powers up mid-line; disable it so OAM is readable.
        mc.write(0xff40, 0x00);
        mc.write(0xff46, 0xc0);
        assert_eq!(mc.read(0xfe00), 0x00);
        assert_eq!(mc.read(0xfe42), 0x42);
        assert_eq!(mc.read(0xfe9f), 0x9f);
    }

    #[test]
    fn test_access_listener_observes_without_altering() {
        struct Recorder(Arc<Mutex<Vec<(Access, u16)>>>);
        impl AccessListener for Recorder {
            fn on_access(&mut self, kind: Access, a: u16) {
                self.0.lock().unwrap().push((kind, a));
            }
        }
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut mc = controller();
        mc.attach_listener(Box::new(Recorder(log.clone())));
        mc.write(0xc000, 0x99);
        assert_eq!(mc.read(0xc000), 0x99);
        let log = log.lock().unwrap();
        assert!(log.contains(&(Access::Write, 0xc000)));
        assert!(log.contains(&(Access::Read, 0xc000)));
    }

    #[test]
    fn test_speed_switch_needs_armed_shift() {
        let mut mc = controller();
        mc.switch_speed();
        assert!(mc.speed == Speed::Normal);
        mc.write(0xff4d, 0x01);
        mc.switch_speed();
        assert!(mc.speed == Speed::Double);
        assert_eq!(mc.read(0xff4d), 0x80);
    }
}
