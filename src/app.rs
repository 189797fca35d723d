use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use javabot::{ApiClient, ApiResponse, ChatWidget, HealthStatus};

/// Backend reachability as shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Checking,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,
    pub widget: ChatWidget,
    pub client: ApiClient,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript viewport
    pub scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // inner height, set during render
    pub chat_lines: u16,  // wrapped line count, set during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub health: Health,

    query_task: Option<JoinHandle<javabot::Result<ApiResponse>>>,
    health_task: Option<JoinHandle<javabot::Result<HealthStatus>>>,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        Self {
            should_quit: false,
            widget: ChatWidget::new(),
            client,

            input: String::new(),
            cursor: 0,

            scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_lines: 0,

            animation_frame: 0,

            health: Health::Checking,

            query_task: None,
            health_task: None,
        }
    }

    /// Send the current input. Blank input, or input typed while a request is
    /// in flight, is left untouched.
    pub fn submit_input(&mut self) {
        let Some(pending) = self.widget.begin_submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.follow_bottom = true;

        let client = self.client.clone();
        self.spawn_query(async move { client.query(&pending.text).await });
    }

    pub fn spawn_query<F>(&mut self, request: F)
    where
        F: Future<Output = javabot::Result<ApiResponse>> + Send + 'static,
    {
        self.query_task = Some(tokio::spawn(request));
    }

    pub fn check_health(&mut self) {
        let client = self.client.clone();
        self.health = Health::Checking;
        self.health_task = Some(tokio::spawn(async move { client.health().await }));
    }

    /// Collect finished background tasks. The query outcome, including a
    /// panicked or cancelled task, always completes the pending submission.
    pub async fn poll_tasks(&mut self) {
        if self.query_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.query_task.take() {
                let outcome = match task.await {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(join_err) => Err(format!("request task failed: {join_err}")),
                };
                self.widget.complete_submit(outcome);
                self.follow_bottom = true;
            }
        }

        if self.health_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.health_task.take() {
                self.health = match task.await {
                    Ok(Ok(status)) if status.is_ok() => {
                        info!(message = %status.message, "backend is up");
                        Health::Online
                    }
                    Ok(Ok(status)) => {
                        warn!(status = %status.status, "backend reported unhealthy");
                        Health::Offline
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, "health check failed");
                        Health::Offline
                    }
                    Err(join_err) => {
                        warn!(error = %join_err, "health check task failed");
                        Health::Offline
                    }
                };
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.widget.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn clear_transcript(&mut self) {
        if self.widget.clear() {
            self.scroll = 0;
            self.follow_bottom = true;
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.min(self.max_scroll()).saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = (self.scroll + lines).min(self.max_scroll());
        self.follow_bottom = self.scroll >= self.max_scroll();
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use javabot::widget::NETWORK_ERROR_MESSAGE;
    use javabot::WidgetState;

    fn test_app() -> App {
        App::new(ApiClient::new("http://127.0.0.1:9/api/query").unwrap())
    }

    async fn exploding_request() -> javabot::Result<ApiResponse> {
        panic!("request task exploded")
    }

    async fn wait_until_idle(app: &mut App) {
        for _ in 0..500 {
            app.poll_tasks().await;
            if !app.widget.is_pending() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("widget stayed pending");
    }

    #[tokio::test]
    async fn test_blank_input_does_not_spawn() {
        let mut app = test_app();
        app.input = "   ".to_string();
        app.submit_input();

        assert!(app.query_task.is_none());
        assert_eq!(app.input, "   ");
        assert!(app.widget.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_panicked_request_still_returns_to_idle() {
        let mut app = test_app();
        app.widget.begin_submit("System.out.println(1);").unwrap();
        app.spawn_query(exploding_request());

        wait_until_idle(&mut app).await;

        assert_eq!(app.widget.state(), WidgetState::Idle);
        assert!(app.widget.input_focused());
        let last = app.widget.transcript().last().unwrap();
        assert_eq!(last.content, NETWORK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_clears_input_and_goes_pending() {
        let mut app = test_app();
        app.input = "What is a JVM?".to_string();
        app.cursor = 14;
        app.submit_input();

        assert!(app.widget.is_pending());
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);

        // Nothing listens on the discard port, so this resolves as a network error
        wait_until_idle(&mut app).await;
        assert_eq!(app.widget.transcript().len(), 2);
    }

    #[test]
    fn test_tick_only_animates_while_pending() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.widget.begin_submit("hello").unwrap();
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_scroll_bounds() {
        let mut app = test_app();
        app.chat_height = 10;
        app.chat_lines = 25;

        app.scroll_down(100);
        assert_eq!(app.scroll, 15);
        assert!(app.follow_bottom);

        app.scroll_up(5);
        assert_eq!(app.scroll, 10);
        assert!(!app.follow_bottom);

        app.scroll_up(50);
        assert_eq!(app.scroll, 0);
    }
}
