//! Foreground owner of the navigator, session context and auth gate.
//!
//! Every remote call is awaited here and its result applied before the next
//! user action; the only detached work is the progress save on backgrounding.

use lesson_core::model::{Identity, ModuleId, ProgressSnapshot, ResumePoint};
use services::{AuthError, AuthGate, ProgressError, UserSession};
use tracing::{debug, warn};
use url::Url;

use crate::context::AppContext;
use crate::vm::{HomeVm, NavError, Navigator, QuizError, QuizScore, button_label, map_home};

pub struct SessionHost {
    context: AppContext,
    navigator: Navigator,
    session: UserSession,
    auth: AuthGate,
    quiz: QuizScore,
}

impl SessionHost {
    #[must_use]
    pub fn new(context: AppContext) -> Self {
        let navigator = Navigator::new(context.catalog(), context.stylesheet().clone());
        let auth = context.auth_gate();
        Self {
            context,
            navigator,
            session: UserSession::new(),
            auth,
            quiz: QuizScore::new(),
        }
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    #[must_use]
    pub fn session(&self) -> &UserSession {
        &self.session
    }

    #[must_use]
    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizScore {
        &self.quiz
    }

    /// Pick up an existing sign-in, fetch its profile and load the catalog.
    ///
    /// Returns the number of modules in the catalog.
    pub async fn launch(&mut self) -> usize {
        if self.auth.check_login(&mut self.session) {
            self.context.progress().refresh_session(&mut self.session).await;
        }
        self.navigator.restore_progress(self.session.profile());
        self.context.content().refresh_catalog().await
    }

    /// # Errors
    ///
    /// Returns `AuthError` if the credentials are rejected.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.auth.sign_in(&mut self.session, email, password).await?;
        self.navigator.restore_progress(self.session.profile());
        Ok(identity)
    }

    /// # Errors
    ///
    /// Returns `AuthError` for a blank name or a rejected account.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity, AuthError> {
        let identity = self
            .auth
            .sign_up(&mut self.session, email, password, name)
            .await?;
        self.navigator.restore_progress(self.session.profile());
        Ok(identity)
    }

    /// # Errors
    ///
    /// Returns `AuthError` if the provider refuses.
    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        self.auth.sign_out(&mut self.session)?;
        self.navigator.leave_module();
        self.navigator.restore_progress(self.session.profile());
        self.quiz = QuizScore::new();
        Ok(())
    }

    #[must_use]
    pub fn home(&self) -> HomeVm {
        map_home(self.session.profile(), &self.navigator.modules())
    }

    /// Select `module`, make sure its lessons are loaded and start at `start`.
    ///
    /// A failed lesson fetch is logged; the walk then uses whatever the catalog holds.
    ///
    /// # Errors
    ///
    /// Returns `NavError::ModuleNotFound` if the module is not in the catalog.
    pub async fn open_lessons(&mut self, module: &ModuleId, start: isize) -> Result<bool, NavError> {
        self.navigator.select_module(module)?;
        if let Err(err) = self.context.content().load_lessons(module).await {
            warn!(error = %err, %module, "lessons could not be loaded");
        }
        self.navigator.refresh_module();
        Ok(self.navigator.begin_lesson_walk(start))
    }

    /// Select `module`, make sure its questions are loaded and start the quiz.
    ///
    /// # Errors
    ///
    /// Returns `NavError::ModuleNotFound` if the module is not in the catalog.
    pub async fn open_quiz(&mut self, module: &ModuleId) -> Result<bool, NavError> {
        self.navigator.select_module(module)?;
        if let Err(err) = self.context.content().load_questions(module).await {
            warn!(error = %err, %module, "questions could not be loaded");
        }
        self.navigator.refresh_module();
        self.quiz = QuizScore::new();
        self.navigator.begin_quiz_walk(module)
    }

    /// Continue from the profile's resume point, if it names a module still in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `NavError::ModuleNotFound` if the stored module is gone.
    pub async fn resume(&mut self) -> Result<bool, NavError> {
        let Some(point) = self.session.profile().resume_point() else {
            return Ok(false);
        };
        let module = point.module().clone();
        self.navigator.select_module(&module)?;
        let content = self.context.content();
        let loaded = match point {
            ResumePoint::Lesson { .. } => content.load_lessons(&module).await,
            ResumePoint::Quiz { .. } => {
                self.quiz = QuizScore::new();
                content.load_questions(&module).await
            }
        };
        if let Err(err) = loaded {
            warn!(error = %err, %module, "resume content could not be loaded");
        }
        self.navigator.resume(&point)
    }

    /// # Errors
    ///
    /// Returns `QuizError` if no question is current or the index is out of range.
    pub fn select_answer(&mut self, index: usize) -> Result<(), QuizError> {
        let question = self
            .navigator
            .current_question()
            .ok_or(QuizError::NothingSelected)?;
        self.quiz.select(question, index)
    }

    /// # Errors
    ///
    /// Returns `QuizError` without a selection or on a second submit.
    pub fn submit_answer(&mut self) -> Result<bool, QuizError> {
        let question = self
            .navigator
            .current_question()
            .ok_or(QuizError::NothingSelected)?;
        self.quiz.submit(question)
    }

    /// Move past a submitted question. Returns whether another question is current.
    pub fn next_question(&mut self) -> bool {
        self.quiz.next_question();
        self.navigator.advance_question()
    }

    /// Label for the quiz's primary button.
    #[must_use]
    pub fn quiz_button_label(&self) -> &'static str {
        button_label(self.quiz.is_submitted(), self.navigator.has_next_question())
    }

    /// Video URL of the current lesson against the configured host.
    #[must_use]
    pub fn current_video_url(&self) -> Option<Url> {
        let lesson = self.navigator.current_lesson()?;
        lesson
            .video_url(self.context.video_host())
            .inspect_err(|err| debug!(error = %err, "lesson video reference is not a URL"))
            .ok()
            .flatten()
    }

    /// Copy the navigator's position into the session and optionally the store.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a requested store write fails.
    pub async fn record_progress(&mut self, write_to_store: bool) -> Result<(), ProgressError> {
        let Some(snapshot) = self.position() else {
            return Ok(());
        };
        self.context
            .progress()
            .record_progress(&mut self.session, &snapshot, write_to_store)
            .await
    }

    /// The app lost the foreground: cache the position and save it without waiting.
    pub fn on_resign_active(&mut self) {
        let Some(snapshot) = self.position() else {
            return;
        };
        self.session.profile_mut().apply_snapshot(&snapshot);
        match self.session.identity().cloned() {
            Some(identity) => self.context.progress().save_in_background(identity, snapshot),
            None => debug!("signed out, progress kept locally only"),
        }
    }

    /// The navigator's position, or `None` when no module was ever visited.
    fn position(&self) -> Option<ProgressSnapshot> {
        let snapshot = self.navigator.progress_snapshot();
        if snapshot.module.is_none() {
            debug!("no module visited, nothing to record");
            return None;
        }
        Some(snapshot)
    }
}
