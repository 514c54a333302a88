use crossterm::event::Event;

pub enum AppEvent {
    Input(Event),
    /// Popup status poll.
    StatusPoll,
    Tick,
}
