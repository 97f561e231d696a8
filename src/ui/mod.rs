pub mod console;
pub mod panel;
pub mod progress;
pub mod prompt;


pub use console::{Console, ConsoleCommand};
pub use panel::{render_panel, render_station};
pub use progress::ProgressObserver;
pub use prompt::TerminalConfirmer;
