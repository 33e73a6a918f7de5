use labcoat_core::{Build, BuildRef, Project};

/// Everything the build screen renders.
#[derive(Debug, Clone)]
pub struct BuildScreenState {
    pub project: Project,
    pub build: Build,
    pub title: String,
    pub subtitle: String,
    pub download_visible: bool,
    pub busy: bool,
    pub last_notice: Option<String>,
    pub notices: Vec<String>,
}

impl BuildScreenState {
    pub fn new(project: Project, build: Build) -> Self {
        let mut state = Self {
            subtitle: project.name_with_namespace.clone(),
            project,
            build,
            title: String::new(),
            download_visible: false,
            busy: false,
            last_notice: None,
            notices: Vec::new(),
        };
        state.refresh_header();
        state
    }

    pub fn target(&self) -> BuildRef {
        BuildRef::of(&self.project, &self.build)
    }

    pub(crate) fn refresh_header(&mut self) {
        self.title = format!("Build #{}", self.build.id);
        self.download_visible = self.build.has_artifacts();
    }
}
