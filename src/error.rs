use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlslOptError {
    #[error("invalid target {0}")]
    InvalidTarget(String),

    #[error("the shader type is not defined. use --vs or --fs.")]
    UndefinedStage,

    #[error("both --vs and --fs are defined. use only one of them.")]
    ConflictingStage,

    #[error("no inputs.")]
    NoInputs,

    #[error("multiple inputs are not supported.")]
    MultipleInputs,

    #[error("{0}")]
    Engine(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}
