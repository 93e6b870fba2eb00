use super::input::InputButton;

/// Console-agnostic interface the front end drives.
///
/// The front end knows nothing about TIA registers or bank schemes: it
/// runs frames, forwards input events by button id and asks for RGB24
/// pixels.
pub trait Machine {
    type Error: std::error::Error;

    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run until the video chip completes its next frame. Stops early
    /// (with an error) on a fatal CPU condition.
    fn run_frame(&mut self) -> Result<(), Self::Error>;

    /// Render the last completed frame into `buffer`
    /// (`width * height * 3` bytes, row-major RGB24).
    fn render_frame(&self, buffer: &mut [u8]);

    /// Latch a button state. `button` is an id from `input_map()`.
    fn set_input(&mut self, button: u8, pressed: bool);

    fn input_map(&self) -> &[InputButton];

    /// Power-cycle: CPU reset sequence, chips back to power-on state.
    /// Cartridge contents are kept.
    fn reset(&mut self);
}
