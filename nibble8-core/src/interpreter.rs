use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, error, trace};

use crate::{
    memory::{FONT_ADDRESS, GLYPH_SIZE, MEMORY_SIZE, PROGRAM_START},
    AddressSpace, FatalError, FrameBuffer, InputLatch, Instruction, LoadError, Rom, Timers,
};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_SIZE: usize = 16;
const FLAG_REGISTER: u8 = 0xF;
const LAST_INSTRUCTION_ADDRESS: u16 = MEMORY_SIZE as u16 - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Fetching and executing on every `cycle()`.
    Running,
    /// Suspended on a key-wait; the key will land in this register.
    AwaitingKey(u8),
    /// Stopped by a fatal error until the next reset or ROM load.
    Halted(FatalError),
}

/// The whole machine: registers, stack, memory, timers, screen and keypad.
///
/// An embedding loop calls [`Interpreter::cycle`] at the CPU rate and
/// [`Interpreter::tick_timers`] at 60 Hz, reports keys through
/// [`Interpreter::set_key`], and reads back the framebuffer and sound state.
pub struct Interpreter {
    memory: AddressSpace,
    data_registers: [u8; REGISTER_COUNT],
    index_register: u16,
    program_counter: u16,
    stack: [u16; STACK_SIZE],
    stack_pointer: usize,
    timers: Timers,
    display: FrameBuffer,
    keyboard: InputLatch,
    rng: StdRng,
    rom: Rom,
    halted: Option<FatalError>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic random numbers, for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            memory: AddressSpace::default(),
            data_registers: [0; REGISTER_COUNT],
            index_register: 0,
            program_counter: PROGRAM_START,
            stack: [0; STACK_SIZE],
            stack_pointer: 0,
            timers: Timers::default(),
            display: FrameBuffer::default(),
            keyboard: InputLatch::default(),
            rng,
            rom: Rom::default(),
            halted: None,
        }
    }

    /// Back to power-on state with the current ROM reloaded.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.memory.place(&self.rom);
        self.data_registers = [0; REGISTER_COUNT];
        self.index_register = 0;
        self.program_counter = PROGRAM_START;
        self.stack = [0; STACK_SIZE];
        self.stack_pointer = 0;
        self.timers = Timers::default();
        self.display.clear();
        self.keyboard = InputLatch::default();
        self.halted = None;
        debug!(rom_size = self.rom.len(), "machine reset");
    }

    /// Start a new session with `program`. An oversized ROM is rejected
    /// before anything about the current session is touched.
    pub fn load_rom(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.rom = Rom::new(program.to_vec())?;
        self.reset();
        Ok(())
    }

    /// Execute one instruction. Does nothing while waiting for a key. Once
    /// a fatal error has been returned, every further call returns it again.
    pub fn cycle(&mut self) -> Result<(), FatalError> {
        if let Some(err) = self.halted {
            return Err(err);
        }
        if self.keyboard.awaiting().is_some() {
            return Ok(());
        }

        self.step().map_err(|err| {
            error!(pc = self.program_counter, %err, "interpreter halted");
            self.halted = Some(err);
            err
        })
    }

    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// Key report from the input collaborator. A press while a key-wait is
    /// pending also completes the wait with that key.
    pub fn set_key(&mut self, index: u8, pressed: bool) {
        self.keyboard.set_key(index, pressed);
        if pressed && self.keyboard.is_pressed(index) {
            self.resolve_wait(index);
        }
    }

    /// Finish a pending key-wait by storing `value` in its register. Returns
    /// false if no wait was pending.
    pub fn resolve_wait(&mut self, value: u8) -> bool {
        match self.keyboard.resolve_wait(value) {
            Some((register, value)) => {
                debug!(register, value, "key-wait resolved");
                *self.register_mut(register) = value;
                true
            }
            None => false,
        }
    }

    /// Complete a pending key-wait with the lowest key currently held down.
    /// The embedding loop calls this every pass, so a key that was already
    /// down when the wait began still satisfies it.
    pub fn poll_key_wait(&mut self) -> bool {
        if self.keyboard.awaiting().is_none() {
            return false;
        }
        match self.keyboard.first_pressed() {
            Some(key) => self.resolve_wait(key),
            None => false,
        }
    }

    pub fn status(&self) -> Status {
        if let Some(err) = self.halted {
            Status::Halted(err)
        } else if let Some(register) = self.keyboard.awaiting() {
            Status::AwaitingKey(register)
        } else {
            Status::Running
        }
    }

    /// Decode the word at the program counter without executing it.
    pub fn current_instruction(&self) -> Result<Instruction, FatalError> {
        let word = self.fetch()?;
        Instruction::decode(word)
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.data_registers
    }

    pub fn register(&self, register_index: u8) -> u8 {
        self.data_registers[register_index as usize]
    }

    pub fn index_register(&self) -> u16 {
        self.index_register
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// Return addresses currently on the stack, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.stack_pointer]
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_pointer
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }

    pub fn display(&self) -> &FrameBuffer {
        &self.display
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn keyboard(&self) -> &InputLatch {
        &self.keyboard
    }

    fn register_mut(&mut self, register_index: u8) -> &mut u8 {
        &mut self.data_registers[register_index as usize]
    }

    fn set_flag(&mut self, flag: bool) {
        *self.register_mut(FLAG_REGISTER) = flag as u8;
    }

    fn fetch(&self) -> Result<u16, FatalError> {
        let pc = self.program_counter;
        if pc % 2 != 0 || pc > LAST_INSTRUCTION_ADDRESS {
            return Err(FatalError::InvalidProgramCounter(pc));
        }
        Ok(self.memory.word(pc)?)
    }

    fn step(&mut self) -> Result<(), FatalError> {
        let word = self.fetch()?;
        let instruction = Instruction::decode(word)?;
        trace!(pc = self.program_counter, word, "{instruction}");

        let next = self.execute(instruction, self.program_counter + 2)?;
        self.program_counter = next;
        Ok(())
    }

    /// Program-issued stores may not touch the interpreter area below
    /// `PROGRAM_START` or run off the end of memory.
    fn check_writable(&self, len: usize) -> Result<(), FatalError> {
        let start = self.index_register;
        if start < PROGRAM_START {
            return Err(FatalError::ProtectedWrite(start));
        }
        self.check_readable(len)
    }

    fn check_readable(&self, len: usize) -> Result<(), FatalError> {
        let start = self.index_register as usize;
        if start + len > MEMORY_SIZE {
            let first_bad = start.max(MEMORY_SIZE).min(u16::MAX as usize);
            return Err(FatalError::AddressOutOfRange(first_bad as u16));
        }
        Ok(())
    }

    /// Run one decoded instruction. `next` is the address of the following
    /// instruction; the returned value becomes the new program counter. Every
    /// failure is detected before any state is changed.
    fn execute(&mut self, instruction: Instruction, next: u16) -> Result<u16, FatalError> {
        use Instruction::*;

        let skip_if = |condition: bool| if condition { next + 2 } else { next };

        match instruction {
            Cls => self.display.clear(),
            Ret => {
                if self.stack_pointer == 0 {
                    return Err(FatalError::StackUnderflow);
                }
                self.stack_pointer -= 1;
                return Ok(self.stack[self.stack_pointer]);
            }
            Jump(address) => return Ok(address),
            Call(address) => {
                if self.stack_pointer == STACK_SIZE {
                    return Err(FatalError::StackOverflow);
                }
                self.stack[self.stack_pointer] = next;
                self.stack_pointer += 1;
                return Ok(address);
            }
            SkipEqImm(vx, value) => return Ok(skip_if(self.register(vx) == value)),
            SkipNeImm(vx, value) => return Ok(skip_if(self.register(vx) != value)),
            SkipEqReg(vx, vy) => return Ok(skip_if(self.register(vx) == self.register(vy))),
            SkipNeReg(vx, vy) => return Ok(skip_if(self.register(vx) != self.register(vy))),
            LoadImm(vx, value) => *self.register_mut(vx) = value,
            AddImm(vx, value) => {
                *self.register_mut(vx) = self.register(vx).wrapping_add(value);
            }
            Copy(vx, vy) => *self.register_mut(vx) = self.register(vy),
            Or(vx, vy) => *self.register_mut(vx) |= self.register(vy),
            And(vx, vy) => *self.register_mut(vx) &= self.register(vy),
            Xor(vx, vy) => *self.register_mut(vx) ^= self.register(vy),
            Add(vx, vy) => {
                let (result, overflow) = self.register(vx).overflowing_add(self.register(vy));
                *self.register_mut(vx) = result;
                self.set_flag(overflow);
            }
            Sub(vx, vy) => {
                let (result, borrow) = self.register(vx).overflowing_sub(self.register(vy));
                *self.register_mut(vx) = result;
                self.set_flag(!borrow);
            }
            SubN(vx, vy) => {
                let (result, borrow) = self.register(vy).overflowing_sub(self.register(vx));
                *self.register_mut(vx) = result;
                self.set_flag(!borrow);
            }
            ShiftRight(vx) => {
                let value = self.register(vx);
                *self.register_mut(vx) = value >> 1;
                self.set_flag(value & 0x01 != 0);
            }
            ShiftLeft(vx) => {
                let value = self.register(vx);
                *self.register_mut(vx) = value << 1;
                self.set_flag(value & 0x80 != 0);
            }
            SetIndex(address) => self.index_register = address,
            JumpV0(address) => return Ok(address + self.register(0x0) as u16),
            Random(vx, mask) => *self.register_mut(vx) = mask & self.rng.gen::<u8>(),
            Draw(vx, vy, rows) => {
                self.check_readable(rows as usize)?;
                let x = self.register(vx);
                let y = self.register(vy);
                let sprite = self.memory.slice(self.index_register, rows as usize)?;
                let collided = self.display.draw(x, y, sprite);
                self.set_flag(collided);
            }
            SkipKey(vx) => return Ok(skip_if(self.keyboard.is_pressed(self.register(vx)))),
            SkipNotKey(vx) => return Ok(skip_if(!self.keyboard.is_pressed(self.register(vx)))),
            LoadDelay(vx) => *self.register_mut(vx) = self.timers.delay,
            WaitKey(vx) => {
                debug!(register = vx, "waiting for key");
                self.keyboard.begin_wait(vx);
            }
            SetDelay(vx) => self.timers.delay = self.register(vx),
            SetSound(vx) => self.timers.sound = self.register(vx),
            AddIndex(vx) => {
                self.index_register = self.index_register.wrapping_add(self.register(vx) as u16);
            }
            Glyph(vx) => {
                let digit = (self.register(vx) & 0x0F) as u16;
                self.index_register = FONT_ADDRESS + digit * GLYPH_SIZE;
            }
            Bcd(vx) => {
                self.check_writable(3)?;
                let value = self.register(vx);
                let digits = [value / 100, value / 10 % 10, value % 10];
                for (offset, digit) in digits.into_iter().enumerate() {
                    self.memory
                        .write(self.index_register + offset as u16, digit)?;
                }
            }
            Store(vx) => {
                self.check_writable(vx as usize + 1)?;
                for i in 0..=vx {
                    self.memory
                        .write(self.index_register + i as u16, self.register(i))?;
                }
            }
            Load(vx) => {
                self.check_readable(vx as usize + 1)?;
                for i in 0..=vx {
                    *self.register_mut(i) = self.memory.read(self.index_register + i as u16)?;
                }
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FONT;
    use proptest::prelude::*;

    fn machine(program: &[u16]) -> Interpreter {
        let bytes: Vec<u8> = program.iter().flat_map(|word| word.to_be_bytes()).collect();
        let mut interpreter = Interpreter::with_seed(8);
        interpreter.load_rom(&bytes).unwrap();
        interpreter
    }

    fn run(interpreter: &mut Interpreter, cycles: usize) {
        for _ in 0..cycles {
            interpreter.cycle().unwrap();
        }
    }

    #[test]
    fn reset_state() {
        let rom = [0x60, 0x12, 0xA3, 0x00];
        let mut interpreter = Interpreter::with_seed(0);
        interpreter.load_rom(&rom).unwrap();
        run(&mut interpreter, 2);
        interpreter.reset();

        assert_eq!(interpreter.program_counter(), 0x200);
        assert_eq!(interpreter.stack_depth(), 0);
        assert_eq!(interpreter.registers(), &[0; 16]);
        assert_eq!(interpreter.index_register(), 0);
        assert!(interpreter.display().is_clear());
        assert_eq!(&interpreter.memory().bytes()[0x050..0x0A0], &FONT[..]);
        assert_eq!(&interpreter.memory().bytes()[0x200..0x204], &rom[..]);
        assert_eq!(interpreter.status(), Status::Running);
    }

    #[test]
    fn oversized_rom_keeps_current_session() {
        let mut interpreter = machine(&[0x6042]);
        run(&mut interpreter, 1);

        let err = interpreter.load_rom(&vec![0; 0xE01]).unwrap_err();
        assert_eq!(err, LoadError::RomTooLarge { size: 0xE01, max: 0xE00 });
        assert_eq!(interpreter.register(0), 0x42);
        assert_eq!(interpreter.program_counter(), 0x202);
    }

    #[test]
    fn add_sets_carry() {
        let mut interpreter = machine(&[0x60FF, 0x6101, 0x8014]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0), 0x00);
        assert_eq!(interpreter.register(0xF), 1);

        let mut interpreter = machine(&[0x60FE, 0x6101, 0x8014]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0), 0xFF);
        assert_eq!(interpreter.register(0xF), 0);
    }

    #[test]
    fn sub_clears_flag_on_borrow() {
        let mut interpreter = machine(&[0x6001, 0x6102, 0x8015]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0), 0xFF);
        assert_eq!(interpreter.register(0xF), 0);
    }

    #[test]
    fn subn_subtracts_the_other_way() {
        let mut interpreter = machine(&[0x6001, 0x6105, 0x8017]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0), 0x04);
        assert_eq!(interpreter.register(0xF), 1);
    }

    #[test]
    fn shifts_act_on_vx_and_report_the_lost_bit() {
        let mut interpreter = machine(&[0x6081, 0x61FF, 0x8016, 0x6281, 0x821E]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0), 0x40);
        assert_eq!(interpreter.register(1), 0xFF);
        assert_eq!(interpreter.register(0xF), 1);

        run(&mut interpreter, 2);
        assert_eq!(interpreter.register(2), 0x02);
        assert_eq!(interpreter.register(0xF), 1);
    }

    #[test]
    fn shifts_clear_flag_when_the_lost_bit_is_zero() {
        let mut interpreter = machine(&[0x6F01, 0x6002, 0x8006, 0x6F01, 0x6101, 0x811E]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0), 0x01);
        assert_eq!(interpreter.register(0xF), 0);

        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(1), 0x02);
        assert_eq!(interpreter.register(0xF), 0);
    }

    #[test]
    fn subn_clears_flag_on_borrow() {
        let mut interpreter = machine(&[0x6F01, 0x6005, 0x6101, 0x8017]);
        run(&mut interpreter, 4);
        assert_eq!(interpreter.register(0), 0xFC);
        assert_eq!(interpreter.register(0xF), 0);
    }

    #[test]
    fn flag_wins_when_vf_is_the_target() {
        let mut interpreter = machine(&[0x6FFF, 0x6101, 0x8F14]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(0xF), 1);
    }

    #[test]
    fn logic_ops_leave_flag_alone() {
        let mut interpreter = machine(&[0x6F07, 0x600C, 0x610A, 0x8011, 0x620C, 0x8212, 0x6306, 0x8313]);
        run(&mut interpreter, 8);
        assert_eq!(interpreter.register(0), 0x0E);
        assert_eq!(interpreter.register(2), 0x08);
        assert_eq!(interpreter.register(3), 0x0C);
        assert_eq!(interpreter.register(0xF), 0x07);
    }

    #[test]
    fn add_immediate_wraps_without_flag() {
        let mut interpreter = machine(&[0x60F0, 0x7020]);
        run(&mut interpreter, 2);
        assert_eq!(interpreter.register(0), 0x10);
        assert_eq!(interpreter.register(0xF), 0);
    }

    #[test]
    fn skips() {
        // SE taken, SNE not taken, SE reg taken, SNE reg taken
        let mut interpreter = machine(&[
            0x6005, 0x3005, 0x0000, 0x4005, 0x6105, 0x5010, 0x0000, 0x9020, 0x0000, 0x6301,
        ]);
        run(&mut interpreter, 7);
        assert_eq!(interpreter.register(3), 1);
        assert_eq!(interpreter.program_counter(), 0x214);
    }

    #[test]
    fn call_then_return() {
        let mut interpreter = machine(&[0x2204, 0x0000, 0x00EE]);
        run(&mut interpreter, 1);
        assert_eq!(interpreter.program_counter(), 0x204);
        assert_eq!(interpreter.stack(), &[0x202]);

        run(&mut interpreter, 1);
        assert_eq!(interpreter.program_counter(), 0x202);
        assert_eq!(interpreter.stack_depth(), 0);
    }

    #[test]
    fn seventeenth_call_overflows_without_side_effects() {
        // 0x200: CALL 0x200 forever
        let mut interpreter = machine(&[0x2200]);
        run(&mut interpreter, 16);
        assert_eq!(interpreter.stack_depth(), 16);

        let registers = *interpreter.registers();
        let memory = interpreter.memory().bytes().to_vec();
        assert_eq!(interpreter.cycle(), Err(FatalError::StackOverflow));
        assert_eq!(interpreter.stack_depth(), 16);
        assert_eq!(interpreter.program_counter(), 0x200);
        assert_eq!(interpreter.registers(), &registers);
        assert_eq!(interpreter.memory().bytes(), &memory[..]);
        assert_eq!(interpreter.status(), Status::Halted(FatalError::StackOverflow));

        // stays halted
        assert_eq!(interpreter.cycle(), Err(FatalError::StackOverflow));
    }

    #[test]
    fn return_on_empty_stack_underflows() {
        let mut interpreter = machine(&[0x00EE]);
        assert_eq!(interpreter.cycle(), Err(FatalError::StackUnderflow));
        assert_eq!(interpreter.program_counter(), 0x200);
    }

    #[test]
    fn unknown_opcode_halts() {
        let mut interpreter = machine(&[0x6001, 0xFFFF, 0x6002]);
        run(&mut interpreter, 1);
        assert_eq!(interpreter.cycle(), Err(FatalError::UnknownOpcode(0xFFFF)));
        assert_eq!(interpreter.cycle(), Err(FatalError::UnknownOpcode(0xFFFF)));
        assert_eq!(interpreter.register(0), 1);

        // a reset starts a fresh session
        interpreter.reset();
        assert_eq!(interpreter.cycle(), Ok(()));
    }

    #[test]
    fn jumps() {
        let mut interpreter = machine(&[0x1206, 0x0000, 0x0000, 0x6004, 0xB300]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.program_counter(), 0x304);
    }

    #[test]
    fn fetch_past_end_of_memory_is_fatal() {
        let mut interpreter = machine(&[0x1FFF]);
        run(&mut interpreter, 1);
        assert_eq!(
            interpreter.cycle(),
            Err(FatalError::InvalidProgramCounter(0xFFF))
        );
    }

    #[test]
    fn draw_sets_collision_flag_and_restores_screen() {
        // I = glyph 0, draw at (V0, V1) twice
        let mut interpreter = machine(&[0x6000, 0xF029, 0x6102, 0x6203, 0xD125, 0xD125]);
        run(&mut interpreter, 5);
        assert_eq!(interpreter.register(0xF), 0);
        assert!(interpreter.display().pixel(2, 3));

        run(&mut interpreter, 1);
        assert_eq!(interpreter.register(0xF), 1);
        assert!(interpreter.display().is_clear());
    }

    #[test]
    fn draw_reading_past_memory_is_fatal() {
        let mut interpreter = machine(&[0xAFFE, 0xD003]);
        run(&mut interpreter, 1);
        assert_eq!(
            interpreter.cycle(),
            Err(FatalError::AddressOutOfRange(0x1000))
        );
        assert!(interpreter.display().is_clear());
    }

    #[test]
    fn clear_screen() {
        let mut interpreter = machine(&[0xA050, 0xD005, 0x00E0]);
        run(&mut interpreter, 2);
        assert!(!interpreter.display().is_clear());
        run(&mut interpreter, 1);
        assert!(interpreter.display().is_clear());
    }

    #[test]
    fn random_is_masked() {
        let mut interpreter = machine(&[0xC00F, 0xC100]);
        run(&mut interpreter, 2);
        assert_eq!(interpreter.register(0) & 0xF0, 0);
        assert_eq!(interpreter.register(1), 0);
    }

    #[test]
    fn key_skips_consult_the_latch() {
        let mut interpreter = machine(&[0x6007, 0xE09E, 0x6101, 0xE0A1, 0x6201]);
        interpreter.set_key(7, true);
        run(&mut interpreter, 4);
        assert_eq!(interpreter.register(1), 0);
        assert_eq!(interpreter.register(2), 1);
    }

    #[test]
    fn key_register_outside_keypad_reads_released() {
        let mut interpreter = machine(&[0x6042, 0xE09E, 0x6101]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.register(1), 1);
    }

    #[test]
    fn key_wait_suspends_until_resolved() {
        let mut interpreter = machine(&[0x6011, 0xF30A, 0x6122]);
        run(&mut interpreter, 2);
        assert_eq!(interpreter.status(), Status::AwaitingKey(3));

        let registers = *interpreter.registers();
        let memory = interpreter.memory().bytes().to_vec();
        let pc = interpreter.program_counter();
        assert_eq!(pc, 0x204);
        run(&mut interpreter, 10);
        assert_eq!(interpreter.registers(), &registers);
        assert_eq!(interpreter.program_counter(), pc);
        assert_eq!(interpreter.memory().bytes(), &memory[..]);

        assert!(interpreter.resolve_wait(0xB));
        assert_eq!(interpreter.register(3), 0xB);
        assert_eq!(interpreter.status(), Status::Running);

        run(&mut interpreter, 1);
        assert_eq!(interpreter.register(1), 0x22);
        assert_eq!(interpreter.program_counter(), 0x206);
    }

    #[test]
    fn key_press_resolves_pending_wait() {
        let mut interpreter = machine(&[0xF50A]);
        run(&mut interpreter, 1);
        interpreter.set_key(0x9, false);
        assert_eq!(interpreter.status(), Status::AwaitingKey(5));
        interpreter.set_key(0x9, true);
        assert_eq!(interpreter.register(5), 0x9);
        assert!(!interpreter.resolve_wait(1));
    }

    #[test]
    fn key_held_before_the_wait_resolves_it_on_poll() {
        let mut interpreter = machine(&[0xF00A, 0x6101]);
        interpreter.set_key(5, true);
        assert!(!interpreter.poll_key_wait());

        interpreter.cycle().unwrap();
        assert_eq!(interpreter.status(), Status::AwaitingKey(0));

        assert!(interpreter.poll_key_wait());
        interpreter.cycle().unwrap();
        assert_eq!(interpreter.status(), Status::Running);
        assert_eq!(interpreter.register(0), 5);
        assert_eq!(interpreter.register(1), 1);
    }

    #[test]
    fn poll_without_held_keys_keeps_waiting() {
        let mut interpreter = machine(&[0xF30A]);
        run(&mut interpreter, 1);
        assert!(!interpreter.poll_key_wait());
        assert_eq!(interpreter.status(), Status::AwaitingKey(3));
    }

    #[test]
    fn timers() {
        let mut interpreter = machine(&[0x6003, 0xF015, 0xF018, 0xF107]);
        run(&mut interpreter, 3);
        assert!(interpreter.sound_active());
        interpreter.tick_timers();
        run(&mut interpreter, 1);
        assert_eq!(interpreter.register(1), 2);

        interpreter.tick_timers();
        interpreter.tick_timers();
        interpreter.tick_timers();
        assert!(!interpreter.sound_active());
        assert_eq!(interpreter.timers(), Timers::default());
    }

    #[test]
    fn glyph_address() {
        let mut interpreter = machine(&[0x601A, 0xF029]);
        run(&mut interpreter, 2);
        assert_eq!(interpreter.index_register(), 0x050 + 0xA * 5);
    }

    #[test]
    fn add_index_does_not_touch_flag() {
        let mut interpreter = machine(&[0xAFFF, 0x6002, 0xF01E]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.index_register(), 0x1001);
        assert_eq!(interpreter.register(0xF), 0);
    }

    #[test]
    fn bcd() {
        let mut interpreter = machine(&[0x60FE, 0xA300, 0xF033]);
        run(&mut interpreter, 3);
        assert_eq!(interpreter.memory().slice(0x300, 3).unwrap(), &[2, 5, 4]);
    }

    #[test]
    fn store_and_load_register_range() {
        let mut interpreter = machine(&[
            0x6001, 0x6102, 0x6203, 0xA400, 0xF255, 0x6000, 0x6100, 0x6200, 0xF165,
        ]);
        run(&mut interpreter, 9);
        assert_eq!(interpreter.memory().slice(0x400, 4).unwrap(), &[1, 2, 3, 0]);
        assert_eq!(&interpreter.registers()[..3], &[1, 2, 0]);
        assert_eq!(interpreter.index_register(), 0x400);
    }

    #[test]
    fn stores_below_program_area_are_fatal() {
        let mut interpreter = machine(&[0x6001, 0xA100, 0xF055]);
        run(&mut interpreter, 2);
        assert_eq!(interpreter.cycle(), Err(FatalError::ProtectedWrite(0x100)));
        assert!(interpreter.memory().bytes()[0x100] == 0);
    }

    #[test]
    fn store_running_off_memory_writes_nothing() {
        let mut interpreter = machine(&[0x6009, 0xAFFE, 0xF255]);
        run(&mut interpreter, 2);
        assert_eq!(
            interpreter.cycle(),
            Err(FatalError::AddressOutOfRange(0x1000))
        );
        assert_eq!(interpreter.memory().slice(0xFFE, 2).unwrap(), &[0, 0]);
    }

    #[test]
    fn current_instruction_is_a_preview() {
        let interpreter = machine(&[0xD125]);
        assert_eq!(interpreter.current_instruction(), Ok(Instruction::Draw(1, 2, 5)));
        assert_eq!(interpreter.program_counter(), 0x200);
    }

    proptest! {
        #[test]
        fn add_flag_matches_wide_sum(a in any::<u8>(), b in any::<u8>()) {
            let mut interpreter = machine(&[0x6000 | a as u16, 0x6100 | b as u16, 0x8014]);
            run(&mut interpreter, 3);
            let sum = a as u16 + b as u16;
            prop_assert_eq!(interpreter.register(0), sum as u8);
            prop_assert_eq!(interpreter.register(0xF), (sum > 0xFF) as u8);
        }

        #[test]
        fn sub_flag_is_no_borrow(a in any::<u8>(), b in any::<u8>()) {
            let mut interpreter = machine(&[0x6000 | a as u16, 0x6100 | b as u16, 0x8015]);
            run(&mut interpreter, 3);
            prop_assert_eq!(interpreter.register(0), a.wrapping_sub(b));
            prop_assert_eq!(interpreter.register(0xF), (a >= b) as u8);
        }

        #[test]
        fn subn_flag_is_no_borrow(a in any::<u8>(), b in any::<u8>()) {
            let mut interpreter = machine(&[0x6000 | a as u16, 0x6100 | b as u16, 0x8017]);
            run(&mut interpreter, 3);
            prop_assert_eq!(interpreter.register(0), b.wrapping_sub(a));
            prop_assert_eq!(interpreter.register(0xF), (b >= a) as u8);
        }

        #[test]
        fn shift_flags_carry_the_lost_bit(value in any::<u8>()) {
            let mut interpreter = machine(&[0x6000 | value as u16, 0x8006]);
            run(&mut interpreter, 2);
            prop_assert_eq!(interpreter.register(0), value >> 1);
            prop_assert_eq!(interpreter.register(0xF), value & 0x01);

            let mut interpreter = machine(&[0x6000 | value as u16, 0x800E]);
            run(&mut interpreter, 2);
            prop_assert_eq!(interpreter.register(0), value << 1);
            prop_assert_eq!(interpreter.register(0xF), value >> 7);
        }

        #[test]
        fn bcd_digits_recombine(value in any::<u8>()) {
            let mut interpreter = machine(&[0x6000 | value as u16, 0xA300, 0xF033]);
            run(&mut interpreter, 3);
            let digits = interpreter.memory().slice(0x300, 3).unwrap();
            prop_assert!(digits.iter().all(|&d| d < 10));
            prop_assert_eq!(digits[0] as u16 * 100 + digits[1] as u16 * 10 + digits[2] as u16, value as u16);
        }
    }
}
