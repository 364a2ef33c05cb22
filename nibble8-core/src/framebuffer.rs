pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// 64x32 monochrome pixel grid, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [bool; DISPLAY_WIDTH * DISPLAY_HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            pixels: [false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl FrameBuffer {
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// XOR `sprite` in at `(x mod 64, y mod 32)`, one byte per row, most
    /// significant bit leftmost. Pixels past the right or bottom edge wrap
    /// around. Returns true if any lit pixel was turned off.
    pub fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x = x as usize % DISPLAY_WIDTH;
        let y = y as usize % DISPLAY_HEIGHT;
        let mut collided = false;

        for (i, &to_draw) in sprite.iter().enumerate() {
            let row = (y + i) % DISPLAY_HEIGHT;
            for j in 0..8 {
                if to_draw & (0x80 >> j) == 0 {
                    continue;
                }
                let col = (x + j) % DISPLAY_WIDTH;
                let pixel = &mut self.pixels[row * DISPLAY_WIDTH + col];
                collided |= *pixel;
                *pixel = !*pixel;
            }
        }

        collided
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + x % DISPLAY_WIDTH]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.iter().all(|&on| !on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn draw_twice_collides_and_restores() {
        let mut fb = FrameBuffer::default();
        assert!(!fb.draw(10, 5, &[0xFF, 0xFF]));
        assert!(fb.pixel(10, 5) && fb.pixel(17, 6));
        assert!(!fb.pixel(18, 5));

        assert!(fb.draw(10, 5, &[0xFF, 0xFF]));
        assert!(fb.is_clear());
    }

    #[test]
    fn draw_wraps_rows_and_columns() {
        let mut fb = FrameBuffer::default();
        fb.draw(62, 31, &[0xC3, 0x81]);

        // 0b1100_0011 at x=62: columns 62, 63, 4, 5
        assert!(fb.pixel(62, 31) && fb.pixel(63, 31));
        assert!(fb.pixel(4, 31) && fb.pixel(5, 31));
        assert!(!fb.pixel(0, 31));
        // second row wraps to the top: columns 62 and 5
        assert!(fb.pixel(62, 0) && fb.pixel(5, 0));
        assert!(!fb.pixel(63, 0));
    }

    #[test]
    fn draw_origin_is_taken_modulo_the_screen() {
        let mut fb = FrameBuffer::default();
        fb.draw(64 + 3, 32 + 2, &[0x80]);
        assert!(fb.pixel(3, 2));
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut fb = FrameBuffer::default();
        fb.draw(0, 0, &[0xFF; 15]);
        assert!(!fb.is_clear());
        fb.clear();
        assert!(fb.is_clear());
    }

    proptest! {
        #[test]
        fn double_draw_is_identity(
            x in any::<u8>(),
            y in any::<u8>(),
            sprite in proptest::collection::vec(any::<u8>(), 0..16),
            background in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            let mut fb = FrameBuffer::default();
            fb.draw(7, 3, &background);
            let before = fb.clone();

            fb.draw(x, y, &sprite);
            fb.draw(x, y, &sprite);

            prop_assert_eq!(&fb, &before);
        }

        #[test]
        fn collision_on_blank_screen_only_on_second_draw(
            x in any::<u8>(),
            y in any::<u8>(),
            sprite in proptest::collection::vec(any::<u8>(), 1..16),
        ) {
            let mut fb = FrameBuffer::default();
            prop_assert!(!fb.draw(x, y, &sprite));
            prop_assert_eq!(fb.draw(x, y, &sprite), sprite.iter().any(|&b| b != 0));
        }
    }
}
