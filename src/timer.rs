// The timer block behind FF04-FF07. DIV free-runs at 16384Hz; TIMA counts
// at the rate selected by TAC and reloads from TMA on overflow, raising the
// timer interrupt.
//
// See: http://gbdev.gg8.se/wiki/articles/Timer_and_Divider_Registers
use super::irq::{Interrupt, Irq};
use super::memory::Memory;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Timer {
    irq: Rc<RefCell<Irq>>,
    // FF04. Incremented at 16384Hz, one tick per 256 machine clocks.
    // Writing any value resets it, together with its accumulator.
    div: u8,
    // FF05. Counts at the TAC rate; overflow reloads TMA and interrupts.
    tima: u8,
    // FF06. Reload value for TIMA.
    tma: u8,
    // FF07:
    //  Bit  2   - Timer Enable
    //  Bits 1-0 - Input Clock Select
    //             00: CPU Clock / 1024   01: CPU Clock / 16
    //             10: CPU Clock / 64     11: CPU Clock / 256
    tac: u8,

    period: u32,
    div_acc: u32,
    tima_acc: u32,
}

impl Timer {
    pub fn power_up(irq: Rc<RefCell<Irq>>) -> Self {
        Self { irq, div: 0, tima: 0, tma: 0, tac: 0, period: 1024, div_acc: 0, tima_acc: 0 }
    }

    pub fn step(&mut self, cycles: u32) {
        // DIV advances once every 256 clocks regardless of TAC.
        self.div_acc += cycles;
        while self.div_acc >= 256 {
            self.div = self.div.wrapping_add(1);
            self.div_acc -= 256;
        }

        if self.tac & 0x04 != 0x00 {
            self.tima_acc += cycles;
            while self.tima_acc >= self.period {
                self.tima = self.tima.wrapping_add(1);
                if self.tima == 0x00 {
                    self.tima = self.tma;
                    self.irq.borrow_mut().raise(Interrupt::Timer);
                }
                self.tima_acc -= self.period;
            }
        }
    }
}

impl Memory for Timer {
    fn read(&self, a: u16) -> u8 {
        match a {
            0xff04 => self.div,
            0xff05 => self.tima,
            0xff06 => self.tma,
            0xff07 => self.tac,
            _ => panic!("Not a timer register: {:#06x}", a),
        }
    }

    fn write(&mut self, a: u16, v: u8) {
        match a {
            0xff04 => {
                self.div = 0x00;
                self.div_acc = 0x00;
            }
            0xff05 => self.tima = v,
            0xff06 => self.tma = v,
            0xff07 => {
                self.tac = v;
                self.period = match v & 0x03 {
                    0x00 => 1024,
                    0x01 => 16,
                    0x02 => 64,
                    _ => 256,
                };
            }
            _ => panic!("Not a timer register: {:#06x}", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (Timer, Rc<RefCell<Irq>>) {
        let irq = Irq::power_up();
        (Timer::power_up(irq.clone()), irq)
    }

    #[test]
    fn test_overflow_reloads_tma_and_interrupts() {
        let (mut timer, irq) = timer();
        // Enabled at 262144Hz: one TIMA tick per 4 machine cycles.
        timer.write(0xff07, 0x05);
        timer.write(0xff05, 0xff);
        timer.write(0xff06, 0x42);
        timer.step(16);
        assert_eq!(timer.read(0xff05), 0x42);
        assert_eq!(irq.borrow().data & 0x04, 0x04);
    }

    #[test]
    fn test_disabled_timer_holds_tima() {
        let (mut timer, irq) = timer();
        timer.write(0xff07, 0x01);
        timer.write(0xff05, 0xf0);
        timer.step(1024);
        assert_eq!(timer.read(0xff05), 0xf0);
        assert_eq!(irq.borrow().data, 0x00);
    }

    #[test]
    fn test_div_rate_and_reset() {
        let (mut timer, _) = timer();
        timer.step(256 * 3);
        assert_eq!(timer.read(0xff04), 0x03);
        timer.step(255);
        timer.write(0xff04, 0x77);
        assert_eq!(timer.read(0xff04), 0x00);
        // The accumulator was cleared too, so a full period is needed again.
        timer.step(255);
        assert_eq!(timer.read(0xff04), 0x00);
        timer.step(1);
        assert_eq!(timer.read(0xff04), 0x01);
    }
}
