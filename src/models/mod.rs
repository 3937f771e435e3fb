pub mod generated_audio;
pub mod json_text;
pub mod localized;
pub mod media;
pub mod stop;
pub mod template;
pub mod tour;
