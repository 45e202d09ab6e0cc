// ==========================================
// 高校排考系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入;
//       排考相关写入一律单事务批量提交
// ==========================================

pub mod enrollment_repo;
pub mod error;
pub mod exam_repo;
pub mod module_repo;
pub mod professor_repo;
pub mod room_repo;
pub mod session_repo;
pub mod supervisor_repo;

// 重导出核心仓储
pub use enrollment_repo::EnrollmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use exam_repo::ExamRepository;
pub use module_repo::ModuleRepository;
pub use professor_repo::ProfessorRepository;
pub use room_repo::ExamRoomRepository;
pub use session_repo::ExamSessionRepository;
pub use supervisor_repo::ExamSupervisorRepository;
