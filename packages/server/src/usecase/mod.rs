//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Hub 層・Domain 層を操作します。

pub mod error;
pub mod issue_command;
pub mod join_party;
pub mod leave_party;

pub use error::UseCaseError;
pub use issue_command::IssueCommandUseCase;
pub use join_party::JoinPartyUseCase;
pub use leave_party::LeavePartyUseCase;
