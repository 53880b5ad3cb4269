use std::error::Error;
use std::process::ExitCode;
use std::str::FromStr;

use led_ceiling::blend::{self, ChannelRounding};
use led_ceiling::config::DEFAULT_FPS;
use led_ceiling::context::AppContext;
use led_ceiling::mock::TerminalPixels;
use led_ceiling::transitions::CircleOut;
use led_ceiling::{
    Animation, Ceiling, CeilingConfig, Color, Flow, Key, KeyError, PixelBuffer, RenderState,
    Scheduler, Strategy,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: led-ceiling [fps] [seconds] [brightness]";

/// A comet circling the middle of the ceiling, leaving a fading tail.
struct Comet {
    angle: f32,
    degrees_per_second: f32,
    running: bool,
}

impl<P: PixelBuffer> Animation<P> for Comet {
    type Error = KeyError;

    fn render(
        &mut self,
        delta: f32,
        _: &RenderState,
        ceiling: &mut Ceiling<P>,
    ) -> Result<Flow, Self::Error> {
        for index in 0..ceiling.number_lights() as i64 {
            let tail = blend::scale(ceiling.get_by_index(index), 0.85, ChannelRounding::Truncate);
            ceiling.set_by_index(index, tail);
        }

        self.angle = (self.angle + self.degrees_per_second * delta) % 360.0;
        let key = Key::polar(0.6, self.angle);
        ceiling.set(key, Color::new(255, 120, 20))?;
        Ok(Flow::from(self.running))
    }

    fn interval_reached(&mut self, _: &mut Ceiling<P>) -> Result<(), Self::Error> {
        self.running = false;
        Ok(())
    }
}

fn parse_arg<T: FromStr>(arg: Option<String>, default: T) -> Result<T, String> {
    match arg {
        None => Ok(default),
        Some(arg) => arg.parse().map_err(|_| format!("invalid argument {arg:?}")),
    }
}

fn run(fps: f32, seconds: f32, context: &AppContext) -> Result<(), Box<dyn Error>> {
    let config = CeilingConfig::default().with_fps(fps);
    let layout = config.validate()?;
    let pixels = TerminalPixels::stdout(&layout).with_brightness(context.brightness());
    let mut ceiling = Ceiling::new(pixels, &config)?;
    ceiling.clear(true)?;

    context.start("comet")?;
    let mut comet = Comet {
        angle: 0.0,
        degrees_per_second: 180.0,
        running: true,
    };
    let result = ceiling.with_strategy(
        Strategy::fractional_polar(),
        |ceiling| -> Result<(), Box<dyn Error>> {
            Scheduler::new(config.fps, Some(seconds))?.run(&mut comet, ceiling)?;
            Ok(())
        },
    );
    match &result {
        Ok(()) => context.finish("comet")?,
        Err(e) => context.crash("comet", e)?,
    }
    result?;

    let mut clear = CircleOut::new(1.5, Color::new(40, 80, 255))?;
    Scheduler::new(config.fps, Some(clear.duration()))?.run(&mut clear, &mut ceiling)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let parsed = parse_arg(args.next(), DEFAULT_FPS).and_then(|fps| {
        let seconds = parse_arg(args.next(), 5.0_f32)?;
        let brightness = parse_arg(args.next(), 255_i32)?;
        Ok((fps, seconds, brightness))
    });
    let (fps, seconds, brightness) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let context = AppContext::default();
    context.set_brightness(brightness);

    match run(fps, seconds, &context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
