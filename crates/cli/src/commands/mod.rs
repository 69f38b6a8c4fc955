pub mod compare;
pub mod fixation;
pub mod init;
pub mod inspect;
pub mod run;
