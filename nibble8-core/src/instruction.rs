use std::fmt;

use crate::FatalError;

/// One decoded instruction word. Register operands are indices `0..16`,
/// addresses are 12 bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipEqImm(u8, u8),
    /// 4XNN
    SkipNeImm(u8, u8),
    /// 5XY0
    SkipEqReg(u8, u8),
    /// 6XNN
    LoadImm(u8, u8),
    /// 7XNN
    AddImm(u8, u8),
    /// 8XY0
    Copy(u8, u8),
    /// 8XY1
    Or(u8, u8),
    /// 8XY2
    And(u8, u8),
    /// 8XY3
    Xor(u8, u8),
    /// 8XY4
    Add(u8, u8),
    /// 8XY5
    Sub(u8, u8),
    /// 8XY6, Y is ignored
    ShiftRight(u8),
    /// 8XY7
    SubN(u8, u8),
    /// 8XYE, Y is ignored
    ShiftLeft(u8),
    /// 9XY0
    SkipNeReg(u8, u8),
    /// ANNN
    SetIndex(u16),
    /// BNNN
    JumpV0(u16),
    /// CXNN
    Random(u8, u8),
    /// DXYN
    Draw(u8, u8, u8),
    /// EX9E
    SkipKey(u8),
    /// EXA1
    SkipNotKey(u8),
    /// FX07
    LoadDelay(u8),
    /// FX0A
    WaitKey(u8),
    /// FX15
    SetDelay(u8),
    /// FX18
    SetSound(u8),
    /// FX1E
    AddIndex(u8),
    /// FX29
    Glyph(u8),
    /// FX33
    Bcd(u8),
    /// FX55
    Store(u8),
    /// FX65
    Load(u8),
}

impl Instruction {
    /// The leading nibble picks the family. Families that share a leading
    /// nibble are told apart by the trailing nibble (5, 8, 9) or the whole
    /// low byte (0, E, F).
    pub fn decode(word: u16) -> Result<Self, FatalError> {
        let [byte_a, byte_b] = word.to_be_bytes();

        let nibble_0 = byte_a >> 4;
        let x = byte_a & 0x0F;
        let y = byte_b >> 4;
        let n = byte_b & 0x0F;

        let address = word & 0x0FFF;
        let immediate_value = byte_b;

        use Instruction::*;
        let instruction = match (nibble_0, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Cls,
            (0x0, 0x0, 0xE, 0xE) => Ret,
            (0x1, _, _, _) => Jump(address),
            (0x2, _, _, _) => Call(address),
            (0x3, _, _, _) => SkipEqImm(x, immediate_value),
            (0x4, _, _, _) => SkipNeImm(x, immediate_value),
            (0x5, _, _, 0x0) => SkipEqReg(x, y),
            (0x6, _, _, _) => LoadImm(x, immediate_value),
            (0x7, _, _, _) => AddImm(x, immediate_value),
            (0x8, _, _, 0x0) => Copy(x, y),
            (0x8, _, _, 0x1) => Or(x, y),
            (0x8, _, _, 0x2) => And(x, y),
            (0x8, _, _, 0x3) => Xor(x, y),
            (0x8, _, _, 0x4) => Add(x, y),
            (0x8, _, _, 0x5) => Sub(x, y),
            (0x8, _, _, 0x6) => ShiftRight(x),
            (0x8, _, _, 0x7) => SubN(x, y),
            (0x8, _, _, 0xE) => ShiftLeft(x),
            (0x9, _, _, 0x0) => SkipNeReg(x, y),
            (0xA, _, _, _) => SetIndex(address),
            (0xB, _, _, _) => JumpV0(address),
            (0xC, _, _, _) => Random(x, immediate_value),
            (0xD, _, _, _) => Draw(x, y, n),
            (0xE, _, 0x9, 0xE) => SkipKey(x),
            (0xE, _, 0xA, 0x1) => SkipNotKey(x),
            (0xF, _, 0x0, 0x7) => LoadDelay(x),
            (0xF, _, 0x0, 0xA) => WaitKey(x),
            (0xF, _, 0x1, 0x5) => SetDelay(x),
            (0xF, _, 0x1, 0x8) => SetSound(x),
            (0xF, _, 0x1, 0xE) => AddIndex(x),
            (0xF, _, 0x2, 0x9) => Glyph(x),
            (0xF, _, 0x3, 0x3) => Bcd(x),
            (0xF, _, 0x5, 0x5) => Store(x),
            (0xF, _, 0x6, 0x5) => Load(x),
            _ => return Err(FatalError::UnknownOpcode(word)),
        };
        Ok(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jump(addr) => write!(f, "JP {addr:#05X}"),
            Call(addr) => write!(f, "CALL {addr:#05X}"),
            SkipEqImm(x, nn) => write!(f, "SE V{x:X}, {nn:#04X}"),
            SkipNeImm(x, nn) => write!(f, "SNE V{x:X}, {nn:#04X}"),
            SkipEqReg(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            LoadImm(x, nn) => write!(f, "LD V{x:X}, {nn:#04X}"),
            AddImm(x, nn) => write!(f, "ADD V{x:X}, {nn:#04X}"),
            Copy(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            Xor(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            Add(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            Sub(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            ShiftRight(x) => write!(f, "SHR V{x:X}"),
            SubN(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            ShiftLeft(x) => write!(f, "SHL V{x:X}"),
            SkipNeReg(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            SetIndex(addr) => write!(f, "LD I, {addr:#05X}"),
            JumpV0(addr) => write!(f, "JP V0, {addr:#05X}"),
            Random(x, nn) => write!(f, "RND V{x:X}, {nn:#04X}"),
            Draw(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            SkipKey(x) => write!(f, "SKP V{x:X}"),
            SkipNotKey(x) => write!(f, "SKNP V{x:X}"),
            LoadDelay(x) => write!(f, "LD V{x:X}, DT"),
            WaitKey(x) => write!(f, "LD V{x:X}, K"),
            SetDelay(x) => write!(f, "LD DT, V{x:X}"),
            SetSound(x) => write!(f, "LD ST, V{x:X}"),
            AddIndex(x) => write!(f, "ADD I, V{x:X}"),
            Glyph(x) => write!(f, "LD F, V{x:X}"),
            Bcd(x) => write!(f, "LD B, V{x:X}"),
            Store(x) => write!(f, "LD [I], V{x:X}"),
            Load(x) => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction::*;
    use super::*;

    #[test]
    fn decodes_every_family() {
        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x1234, Jump(0x234)),
            (0x2456, Call(0x456)),
            (0x342A, SkipEqImm(0x4, 0x2A)),
            (0x4A75, SkipNeImm(0xA, 0x75)),
            (0x5AE0, SkipEqReg(0xA, 0xE)),
            (0x63F5, LoadImm(0x3, 0xF5)),
            (0x7B12, AddImm(0xB, 0x12)),
            (0x8590, Copy(0x5, 0x9)),
            (0x8101, Or(0x1, 0x0)),
            (0x8642, And(0x6, 0x4)),
            (0x87F3, Xor(0x7, 0xF)),
            (0x8264, Add(0x2, 0x6)),
            (0x8C45, Sub(0xC, 0x4)),
            (0x8126, ShiftRight(0x1)),
            (0x86D7, SubN(0x6, 0xD)),
            (0x8E0E, ShiftLeft(0xE)),
            (0x9990, SkipNeReg(0x9, 0x9)),
            (0xA568, SetIndex(0x568)),
            (0xBABC, JumpV0(0xABC)),
            (0xC5AF, Random(0x5, 0xAF)),
            (0xD7B0, Draw(0x7, 0xB, 0)),
            (0xE49E, SkipKey(0x4)),
            (0xECA1, SkipNotKey(0xC)),
            (0xF907, LoadDelay(0x9)),
            (0xFD0A, WaitKey(0xD)),
            (0xF315, SetDelay(0x3)),
            (0xF718, SetSound(0x7)),
            (0xF91E, AddIndex(0x9)),
            (0xFF29, Glyph(0xF)),
            (0xF533, Bcd(0x5)),
            (0xF655, Store(0x6)),
            (0xF865, Load(0x8)),
        ];

        for (word, expected) in cases {
            assert_eq!(Instruction::decode(word), Ok(expected), "{word:#06X}");
        }
    }

    #[test]
    fn rejects_words_outside_the_table() {
        for word in [0x0000, 0x0123, 0x00E1, 0x5121, 0x8008, 0x800F, 0x9001, 0xE19F, 0xF000, 0xF075, 0xFFFF] {
            assert_eq!(
                Instruction::decode(word),
                Err(FatalError::UnknownOpcode(word)),
                "{word:#06X}"
            );
        }
    }

    #[test]
    fn disassembles_to_mnemonics() {
        assert_eq!(Cls.to_string(), "CLS");
        assert_eq!(Jump(0x2A0).to_string(), "JP 0x2A0");
        assert_eq!(LoadImm(1, 0x0C).to_string(), "LD V1, 0x0C");
        assert_eq!(Draw(0, 1, 5).to_string(), "DRW V0, V1, 5");
        assert_eq!(Store(0xA).to_string(), "LD [I], VA");
    }
}
