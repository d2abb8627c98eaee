// The two console revisions this core emulates. The monochrome Game Boy and
// the Game Boy Color share the same CPU core; the color model adds banked
// VRAM/WRAM, color palette memory, VRAM DMA and a switchable clock speed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Model {
    Dmg,
    Cgb,
}

impl Model {
    pub fn is_cgb(self) -> bool {
        self == Model::Cgb
    }
}
