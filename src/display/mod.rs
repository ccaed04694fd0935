mod canvas;
mod pixel_buffer;

pub use canvas::{Canvas, Color, Paint, RadialGradient, Surface};
pub use pixel_buffer::PixelBuffer;

use crate::error::{AppError, Result};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas as SdlCanvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

pub struct Display {
    canvas: SdlCanvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

pub struct RenderTarget<'a> {
    texture: Texture<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
    /// Left button press in window coordinates
    Click {
        x: i32,
        y: i32,
    },
}

impl Display {
    /// Create display with custom resolution and VSync settings
    /// vsync=true: locked to monitor refresh (typically 60fps)
    /// vsync=false: uncapped, the effect still steps at its fixed tick
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>)> {
        let sdl_context = sdl2::init().map_err(AppError::Sdl)?;
        let video_subsystem = sdl_context.video().map_err(AppError::Sdl)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(AppError::sdl)?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(AppError::sdl)?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump().map_err(AppError::Sdl)?;

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn present(&mut self, target: &mut RenderTarget, buffer: &PixelBuffer) -> Result<()> {
        target
            .texture
            .update(None, buffer.as_bytes(), (buffer.width() * 4) as usize)
            .map_err(AppError::sdl)?;

        self.canvas
            .copy(&target.texture, None, None)
            .map_err(AppError::Sdl)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                Event::MouseButtonDown {
                    x,
                    y,
                    mouse_btn: MouseButton::Left,
                    ..
                } => events.push(InputEvent::Click { x, y }),
                _ => {},
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    /// Create a streaming texture matching the pixel buffer size
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA8888, width, height)
            .map_err(AppError::sdl)?;
        Ok(Self { texture })
    }
}
