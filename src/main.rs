mod analytics;
mod app;
mod audio;
mod config;
mod control;
mod events;
mod i18n;
mod library;
mod modal;
mod notify;
mod runtime;
mod timer;
mod ui;
mod user_data;

fn main() {
    if let Err(e) = runtime::run() {
        eprintln!("somna: {e}");
        std::process::exit(1);
    }
}
