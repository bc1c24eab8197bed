use lesson_core::model::{Module, ModuleId, ResumePoint, UserProfile};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleCardKind {
    Lessons,
    Test,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleCardVm {
    pub module: ModuleId,
    pub kind: ModuleCardKind,
    pub title: String,
    pub description: String,
    pub image: String,
    pub count_label: String,
    pub time_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumeBannerVm {
    pub title: String,
    pub point: ResumePoint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HomeVm {
    pub title: &'static str,
    pub resume: Option<ResumeBannerVm>,
    pub cards: Vec<ModuleCardVm>,
}

/// The lessons card and the test card for one module.
#[must_use]
pub fn map_module_cards(module: &Module) -> [ModuleCardVm; 2] {
    let content = module.content().descriptor();
    let test = module.test().descriptor();
    [
        ModuleCardVm {
            module: module.id().clone(),
            kind: ModuleCardKind::Lessons,
            title: format!("Learn {}", module.category()),
            description: content.description.clone(),
            image: content.image.clone(),
            count_label: format!("{} Lessons", module.lessons().len()),
            time_label: content.time.clone(),
        },
        ModuleCardVm {
            module: module.id().clone(),
            kind: ModuleCardKind::Test,
            title: format!("{} Test", module.category()),
            description: test.description.clone(),
            image: test.image.clone(),
            count_label: format!("{} Questions", module.questions().len()),
            time_label: test.time.clone(),
        },
    ]
}

#[must_use]
pub fn home_title(profile: &UserProfile) -> &'static str {
    if profile.has_history() {
        "Welcome back"
    } else {
        "Get Started"
    }
}

/// Banner for where the user left off, resolved against the current catalog by id.
#[must_use]
pub fn map_resume_banner(profile: &UserProfile, modules: &[Module]) -> Option<ResumeBannerVm> {
    let point = profile.resume_point()?;
    let module = modules.iter().find(|m| m.id() == point.module())?;
    let title = match &point {
        ResumePoint::Lesson { index, .. } => {
            format!("Learn {}: Lesson {}", module.category(), index + 1)
        }
        ResumePoint::Quiz { index, .. } => {
            format!("{} Test: Question {}", module.category(), index + 1)
        }
    };
    Some(ResumeBannerVm { title, point })
}

#[must_use]
pub fn map_home(profile: &UserProfile, modules: &[Module]) -> HomeVm {
    HomeVm {
        title: home_title(profile),
        resume: map_resume_banner(profile, modules),
        cards: modules.iter().flat_map(map_module_cards).collect(),
    }
}
