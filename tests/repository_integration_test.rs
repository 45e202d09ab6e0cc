// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证各仓储的读写往返、批量提交与清除语义
// ==========================================

use chrono::{NaiveDate, NaiveTime, Utc};
use exam_aps::domain::professor::ExamSupervisor;
use exam_aps::domain::types::{ExamStatus, RoomType, SupervisorRole};
use exam_aps::repository::{
    EnrollmentRepository, ExamRepository, ExamRoomRepository, ExamSessionRepository,
    ExamSupervisorRepository, ModuleRepository, ProfessorRepository, RepositoryError,
};

use test_helpers::*;

fn seed_minimal(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let module_repo = ModuleRepository::new(db_path)?;
    let session_repo = ExamSessionRepository::new(db_path)?;

    module_repo.insert_department("D001", "计算机学院")?;
    module_repo.insert_formation(&build_formation("F001", "D001"))?;
    module_repo.insert_module(&build_module("M001", "F001"))?;
    module_repo.insert_module(&build_module("M002", "F001"))?;

    session_repo.insert(&build_session(
        "S001",
        NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, 22).unwrap(),
    ))?;

    Ok(())
}

// ==========================================
// 批次仓储
// ==========================================

#[test]
fn test_session_roundtrip_and_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;
    let repo = ExamSessionRepository::new(&db_path)?;

    let session = build_session(
        "S001",
        NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, 22).unwrap(),
    );
    repo.insert(&session)?;

    let loaded = repo.find_by_id("S001")?.expect("应能读回批次");
    assert_eq!(loaded.start_date, session.start_date);
    assert_eq!(loaded.end_date, session.end_date);
    assert_eq!(loaded.academic_year, "2025-2026");

    assert!(repo.find_by_id("S999")?.is_none());
    let err = repo.require_by_id("S999").unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    Ok(())
}

// ==========================================
// 考试仓储
// ==========================================

#[test]
fn test_pending_exams_hardest_first_order() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;
    seed_minimal(&db_path)?;
    let module_repo = ModuleRepository::new(&db_path)?;
    module_repo.insert_module(&build_module("M003", "F001"))?;

    let exam_repo = ExamRepository::new(&db_path)?;
    exam_repo.insert_batch(&[
        build_pending_exam("E-b", "M001", "S001", 10),
        build_pending_exam("E-a", "M002", "S001", 50),
        build_pending_exam("E-c", "M003", "S001", 50),
    ])?;

    let pending = exam_repo.find_pending_by_session("S001")?;
    // 人数降序; 同人数按 exam_id 升序
    assert_eq!(
        pending.iter().map(|e| e.exam_id.as_str()).collect::<Vec<_>>(),
        vec!["E-a", "E-c", "E-b"]
    );

    Ok(())
}

#[test]
fn test_commit_schedule_batch_and_views() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;
    seed_minimal(&db_path)?;

    let room_repo = ExamRoomRepository::new(&db_path)?;
    room_repo.insert(&build_room("R001", 40, RoomType::Classroom))?;

    let exam_repo = ExamRepository::new(&db_path)?;
    let mut exam = build_pending_exam("E001", "M001", "S001", 25);
    exam_repo.insert_batch(std::slice::from_ref(&exam))?;

    // 落位并批量提交
    exam.place(
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
        NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        "R001".to_string(),
    );
    let updated = exam_repo.commit_schedule_batch(std::slice::from_ref(&exam))?;
    assert_eq!(updated, 1);

    let scheduled = exam_repo.find_scheduled_by_session("S001")?;
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].status, ExamStatus::Scheduled);
    assert_eq!(
        scheduled[0].start_time,
        NaiveTime::from_hms_opt(8, 30, 0)
    );

    // 审计视图联表内容
    let views = exam_repo.list_scheduled_views("S001")?;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].module_name, "课程M001");
    assert_eq!(views[0].room_name, "考场R001");
    assert_eq!(views[0].room_capacity, 40);
    assert_eq!(views[0].expected_students, 25);

    Ok(())
}

#[test]
fn test_clear_session_schedule_resets_fields() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;
    seed_minimal(&db_path)?;

    let room_repo = ExamRoomRepository::new(&db_path)?;
    room_repo.insert(&build_room("R001", 40, RoomType::Classroom))?;

    let exam_repo = ExamRepository::new(&db_path)?;
    let mut exam = build_pending_exam("E001", "M001", "S001", 25);
    exam_repo.insert_batch(std::slice::from_ref(&exam))?;
    exam.place(
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
        NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        "R001".to_string(),
    );
    exam_repo.commit_schedule_batch(std::slice::from_ref(&exam))?;

    let cleared = exam_repo.clear_session_schedule("S001")?;
    assert_eq!(cleared, 1);
    // 再次清除: 无已排期考试,计数为 0
    assert_eq!(exam_repo.clear_session_schedule("S001")?, 0);

    let reloaded = exam_repo.require_by_id("E001")?;
    assert_eq!(reloaded.status, ExamStatus::Pending);
    assert!(reloaded.scheduled_date.is_none());
    assert!(reloaded.start_time.is_none());
    assert!(reloaded.room_id.is_none());

    Ok(())
}

// ==========================================
// 选课仓储
// ==========================================

#[test]
fn test_enrollment_counts_and_dedup() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;
    seed_minimal(&db_path)?;

    let repo = EnrollmentRepository::new(&db_path)?;
    repo.insert_batch(&build_enrollments("M001", "s", 12))?;
    repo.insert_batch(&build_enrollments("M002", "s", 4))?;
    // 重复插入被忽略 (主键去重)
    let inserted_again = repo.insert_batch(&build_enrollments("M001", "s", 12))?;
    assert_eq!(inserted_again, 0);

    let counts = repo.count_by_module()?;
    assert_eq!(counts.get("M001").copied(), Some(12));
    assert_eq!(counts.get("M002").copied(), Some(4));

    assert_eq!(repo.list_all()?.len(), 16);

    Ok(())
}

// ==========================================
// 考场仓储
// ==========================================

#[test]
fn test_rooms_usable_filter_and_order() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;

    let repo = ExamRoomRepository::new(&db_path)?;
    repo.insert(&build_room("R-big", 100, RoomType::Amphi))?;
    repo.insert(&build_room("R-small", 20, RoomType::Classroom))?;
    let mut inactive = build_room("R-closed", 50, RoomType::Classroom);
    inactive.is_active = false;
    repo.insert(&inactive)?;
    let mut unavailable = build_room("R-busy", 60, RoomType::Classroom);
    unavailable.is_available = false;
    repo.insert(&unavailable)?;

    let usable = repo.list_usable()?;
    // 停用/占用考场被过滤,剩余按容量升序
    assert_eq!(
        usable.iter().map(|r| r.room_id.as_str()).collect::<Vec<_>>(),
        vec!["R-small", "R-big"]
    );

    Ok(())
}

// ==========================================
// 监考仓储
// ==========================================

#[test]
fn test_supervisor_unique_constraint_and_delete() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;
    seed_minimal(&db_path)?;

    let professor_repo = ProfessorRepository::new(&db_path)?;
    professor_repo.insert(&build_professor("P001", "D001"))?;

    let exam_repo = ExamRepository::new(&db_path)?;
    exam_repo.insert_batch(&[build_pending_exam("E001", "M001", "S001", 25)])?;

    let repo = ExamSupervisorRepository::new(&db_path)?;
    let supervisor = ExamSupervisor {
        supervisor_id: "SUP001".to_string(),
        exam_id: "E001".to_string(),
        professor_id: "P001".to_string(),
        role: SupervisorRole::Responsible,
        is_department_exam: true,
        created_at: Utc::now(),
    };
    repo.insert_batch(std::slice::from_ref(&supervisor))?;

    // 同一教师同一考试第二次插入违反唯一约束
    let duplicate = ExamSupervisor {
        supervisor_id: "SUP002".to_string(),
        ..supervisor.clone()
    };
    let err = repo.insert_batch(std::slice::from_ref(&duplicate)).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::UniqueConstraintViolation(_) | RepositoryError::DatabaseQueryError(_)
    ));

    let listed = repo.list_by_session("S001")?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].role, SupervisorRole::Responsible);

    assert_eq!(repo.count_distinct_professors("S001")?, 1);
    assert_eq!(repo.delete_by_session("S001")?, 1);
    assert!(repo.list_by_session("S001")?.is_empty());

    Ok(())
}

// ==========================================
// 课程仓储
// ==========================================

#[test]
fn test_module_academic_year_filter_and_dept_map() -> Result<(), Box<dyn std::error::Error>> {
    let (_file, db_path) = create_test_db()?;

    let repo = ModuleRepository::new(&db_path)?;
    repo.insert_department("D001", "计算机学院")?;
    repo.insert_department("D002", "数学学院")?;
    repo.insert_formation(&build_formation("F001", "D001"))?;

    let mut old_formation = build_formation("F-old", "D002");
    old_formation.academic_year = "2024-2025".to_string();
    repo.insert_formation(&old_formation)?;

    repo.insert_module(&build_module("M001", "F001"))?;
    repo.insert_module(&build_module("M-old", "F-old"))?;
    let mut disabled = build_module("M-off", "F001");
    disabled.is_active = false;
    repo.insert_module(&disabled)?;

    // 学年过滤 + 启用过滤
    let modules = repo.list_active_by_academic_year("2025-2026")?;
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].module_id, "M001");

    // 院系映射覆盖全部课程
    let dept_map = repo.module_department_map()?;
    assert_eq!(dept_map.get("M001").map(String::as_str), Some("D001"));
    assert_eq!(dept_map.get("M-old").map(String::as_str), Some("D002"));

    Ok(())
}
