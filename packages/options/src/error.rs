use formbind_common::CommonError;
use formbind_evaluator::EvalError;
use thiserror::Error;

pub type OptionsResult<T> = Result<T, OptionsError>;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Path(#[from] CommonError),
}
