const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub const SPINNER_FRAME_COUNT: usize = FRAMES.len();

pub fn frame(idx: usize) -> char {
    FRAMES[idx % SPINNER_FRAME_COUNT]
}
