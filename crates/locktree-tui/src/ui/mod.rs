pub(crate) mod loading;
pub(crate) mod modal;
pub(crate) mod text;
