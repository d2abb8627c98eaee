// The eight buttons are a 2x4 matrix behind FF00: the program selects the
// button or direction column by writing bits 4-5, then reads the row state
// from bits 0-3 (0 = pressed).
//
// FF00 - P1/JOYP - Joypad (R/W)
// Bit 5 - P15 Select Button Keys      (0=Select)
// Bit 4 - P14 Select Direction Keys   (0=Select)
// Bit 3 - P13 Input Down  or Start    (0=Pressed) (Read Only)
// Bit 2 - P12 Input Up    or Select   (0=Pressed) (Read Only)
// Bit 1 - P11 Input Left  or Button B (0=Pressed) (Read Only)
// Bit 0 - P10 Input Right or Button A (0=Pressed) (Read Only)
//
// Key state crosses the thread boundary through a shared atomic byte: the
// front end sets and clears level-triggered bits, the emulation thread
// folds the byte into the matrix once per executed instruction.
use super::irq::{Interrupt, Irq};
use super::memory::Memory;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[rustfmt::skip]
#[derive(Clone, Copy)]
pub enum JoypadKey {
    Right  = 0b0000_0001,
    Left   = 0b0000_0010,
    Up     = 0b0000_0100,
    Down   = 0b0000_1000,
    A      = 0b0001_0000,
    B      = 0b0010_0000,
    Select = 0b0100_0000,
    Start  = 0b1000_0000,
}

pub struct Joypad {
    irq: Rc<RefCell<Irq>>,
    shadow: Arc<AtomicU8>,
    // Matrix bits follow JoypadKey; 1 = released.
    matrix: u8,
    select: u8,
}

impl Joypad {
    // The shadow byte is allocated by the console so the front end holds a
    // handle before the emulation thread even starts.
    pub fn power_up(irq: Rc<RefCell<Irq>>, shadow: Arc<AtomicU8>) -> Self {
        Self { irq, shadow, matrix: 0xff, select: 0x00 }
    }

    // The handle the front end uses to press and release keys.
    pub fn shadow(&self) -> Arc<AtomicU8> {
        self.shadow.clone()
    }

    pub fn keydown(&mut self, key: JoypadKey) {
        self.matrix &= !(key as u8);
        self.irq.borrow_mut().raise(Interrupt::Joypad);
    }

    pub fn keyup(&mut self, key: JoypadKey) {
        self.matrix |= key as u8;
    }

    // Folds the shadow byte into the matrix; a bit that went from released
    // to pressed raises the joypad interrupt.
    pub fn poll(&mut self) {
        let pressed = self.shadow.load(Ordering::Relaxed);
        let fresh = self.matrix & pressed;
        self.matrix = !pressed;
        if fresh != 0x00 {
            self.irq.borrow_mut().raise(Interrupt::Joypad);
        }
    }
}

impl Memory for Joypad {
    fn read(&self, a: u16) -> u8 {
        assert_eq!(a, 0xff00);
        if self.select & 0b0001_0000 == 0x00 {
            return 0b1100_0000 | self.select | (self.matrix & 0x0f);
        }
        if self.select & 0b0010_0000 == 0x00 {
            return 0b1100_0000 | self.select | (self.matrix >> 4);
        }
        0b1100_0000 | self.select | 0x0f
    }

    fn write(&mut self, a: u16, v: u8) {
        assert_eq!(a, 0xff00);
        // Only the column select bits are writable.
        self.select = v & 0b0011_0000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Joypad {
        Joypad::power_up(Irq::power_up(), Arc::new(AtomicU8::new(0x00)))
    }

    #[test]
    fn test_matrix_read_by_column() {
        let mut joypad = fresh();
        joypad.keydown(JoypadKey::Right);
        joypad.keydown(JoypadKey::Start);
        joypad.write(0xff00, 0b0010_0000);
        assert_eq!(joypad.read(0xff00) & 0x0f, 0b0000_1110);
        joypad.write(0xff00, 0b0001_0000);
        assert_eq!(joypad.read(0xff00) & 0x0f, 0b0000_0111);
    }

    #[test]
    fn test_low_nibble_write_ignored() {
        let mut joypad = fresh();
        joypad.write(0xff00, 0b0011_1111);
        assert_eq!(joypad.read(0xff00) & 0x30, 0b0011_0000);
    }

    #[test]
    fn test_poll_raises_interrupt_on_fresh_press() {
        let irq = Irq::power_up();
        let mut joypad = Joypad::power_up(irq.clone(), Arc::new(AtomicU8::new(0x00)));
        let shadow = joypad.shadow();

        shadow.store(JoypadKey::A as u8, Ordering::Relaxed);
        joypad.poll();
        assert_eq!(irq.borrow().data & 0x10, 0x10);

        // Held key: no further interrupt.
        irq.borrow_mut().data = 0x00;
        joypad.poll();
        assert_eq!(irq.borrow().data, 0x00);

        shadow.store(0x00, Ordering::Relaxed);
        joypad.poll();
        joypad.write(0xff00, 0b0010_0000);
        assert_eq!(joypad.read(0xff00) & 0x0f, 0x0f);
    }
}
