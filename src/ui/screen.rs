use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui::{render_profile, render_quiz, render_results};

/// A UI screen boundary: renders one `AppState`
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Question, options and reveal feedback
pub struct QuizScreen;

impl Screen for QuizScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_quiz(app, area, f.buffer_mut());
    }
}

/// Last session report, rewards and recent history
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_results(app, area, f.buffer_mut());
    }
}

pub struct ProfileScreen;

impl Screen for ProfileScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_profile(app, area, f.buffer_mut());
    }
}

pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Quiz => Box::new(QuizScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Profile => Box::new(ProfileScreen),
    }
}

/// Draw whichever screen the app is on
pub fn draw(app: &App, f: &mut Frame) {
    current_screen(app.state()).render(app, f);
}
