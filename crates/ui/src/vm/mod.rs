mod home_vm;
mod navigator;
mod quiz_vm;
mod rich_text;
mod walk;

pub use home_vm::{
    HomeVm, ModuleCardKind, ModuleCardVm, ResumeBannerVm, home_title, map_home, map_module_cards,
    map_resume_banner,
};
pub use navigator::{NavError, NavState, Navigator};
pub use quiz_vm::{QuizError, QuizScore, button_label, result_heading, result_summary};
pub use rich_text::{Block, BlockKind, RenderError, Run, StyledText, render, try_render};
pub use walk::Walk;
