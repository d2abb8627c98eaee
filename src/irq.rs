// FF0F - IF - Interrupt Flag (R/W)
// Bit 0: V-Blank  Interrupt Request (INT 40h)  (1=Request)
// Bit 1: LCD STAT Interrupt Request (INT 48h)  (1=Request)
// Bit 2: Timer    Interrupt Request (INT 50h)  (1=Request)
// Bit 3: Serial   Interrupt Request (INT 58h)  (1=Request)
// Bit 4: Joypad   Interrupt Request (INT 60h)  (1=Request)
//
// The request register is shared between every peripheral that can raise an
// interrupt, so it is passed around as Rc<RefCell<Irq>>.
use std::cell::RefCell;
use std::rc::Rc;

#[rustfmt::skip]
#[derive(Clone, Copy)]
pub enum Interrupt {
    VBlank  = 0,
    LcdStat = 1,
    Timer   = 2,
    Serial  = 3,
    Joypad  = 4,
}

pub struct Irq {
    pub data: u8,
}

impl Irq {
    pub fn power_up() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { data: 0x00 }))
    }

    pub fn raise(&mut self, i: Interrupt) {
        self.data |= 1 << i as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::{Interrupt, Irq};

    #[test]
    fn test_raise_sets_request_bit() {
        let irq = Irq::power_up();
        irq.borrow_mut().raise(Interrupt::Timer);
        irq.borrow_mut().raise(Interrupt::Joypad);
        assert_eq!(irq.borrow().data, 0b0001_0100);
    }
}
