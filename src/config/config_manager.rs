// ==========================================
// 高校排考系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use chrono::NaiveTime;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// SchedulePolicy - 排考策略值对象
// ==========================================
// 一次排考运行装配一份,按引用传入各引擎;
// 不存在任何模块级全局配置单例
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePolicy {
    pub slot_times: Vec<NaiveTime>,        // 每日开始时间 (升序)
    pub excluded_weekdays: Vec<u32>,       // 排除星期 (ISO 1=周一..7=周日)
    pub supervisor_student_ratio: i32,     // 每 N 名学生配 1 名监考
    pub min_supervisors_per_exam: i32,     // 每场最少监考人数
    pub default_max_exams_per_day: i32,    // 教师单日监考上限默认值
    pub dept_match_bonus: f64,             // 本院系亲和加分
    pub load_penalty_weight: f64,          // 负载扣分权重
    pub fallback_expected_students: i32,   // 预计人数兜底值
    pub student_conflict_report_cap: usize, // 学生冲突报告上限
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            slot_times: vec![
                NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            ],
            excluded_weekdays: vec![5],
            supervisor_student_ratio: 25,
            min_supervisors_per_exam: 2,
            default_max_exams_per_day: 3,
            dept_match_bonus: 20.0,
            load_penalty_weight: 5.0,
            fallback_expected_students: 50,
            student_conflict_report_cap: 50,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }
}

// ==========================================
// ScheduleConfigReader Trait 实现
// ==========================================
#[async_trait(?Send)]
impl ScheduleConfigReader for ConfigManager {
    // ===== 时段配置 =====

    async fn get_slot_times(&self) -> Result<Vec<NaiveTime>, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::SLOT_TIMES, "08:30,11:00,13:30,16:00")?;

        let mut times: Vec<NaiveTime> = value
            .split(',')
            .filter_map(|s| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok())
            .collect();
        times.sort();

        if times.is_empty() {
            tracing::warn!(
                config_key = config_keys::SLOT_TIMES,
                raw_value = %value,
                "时段配置格式错误，使用默认时段"
            );
            Ok(SchedulePolicy::default().slot_times)
        } else {
            Ok(times)
        }
    }

    async fn get_excluded_weekdays(&self) -> Result<Vec<u32>, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::EXCLUDED_WEEKDAYS, "5")?;

        let days: Vec<u32> = value
            .split(',')
            .filter_map(|s| s.trim().parse::<u32>().ok())
            .filter(|&d| (1..=7).contains(&d))
            .collect();

        // 空列表是合法配置: 表示窗口内每一天都可排考
        Ok(days)
    }

    // ===== 监考配置 =====

    async fn get_supervisor_student_ratio(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SUPERVISOR_STUDENT_RATIO, "25")?;
        let ratio = value.parse::<i32>().unwrap_or(25);
        Ok(if ratio > 0 { ratio } else { 25 })
    }

    async fn get_min_supervisors_per_exam(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MIN_SUPERVISORS_PER_EXAM, "2")?;
        Ok(value.parse::<i32>().unwrap_or(2))
    }

    async fn get_default_max_exams_per_day(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_MAX_EXAMS_PER_DAY, "3")?;
        Ok(value.parse::<i32>().unwrap_or(3))
    }

    async fn get_dept_match_bonus(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEPT_MATCH_BONUS, "20.0")?;
        Ok(value.parse::<f64>().unwrap_or(20.0))
    }

    async fn get_load_penalty_weight(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOAD_PENALTY_WEIGHT, "5.0")?;
        Ok(value.parse::<f64>().unwrap_or(5.0))
    }

    // ===== 排期配置 =====

    async fn get_fallback_expected_students(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::FALLBACK_EXPECTED_STUDENTS, "50")?;
        Ok(value.parse::<i32>().unwrap_or(50))
    }

    // ===== 审计配置 =====

    async fn get_student_conflict_report_cap(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::STUDENT_CONFLICT_REPORT_CAP, "50")?;
        Ok(value.parse::<usize>().unwrap_or(50))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 时段
    pub const SLOT_TIMES: &str = "slot_times";
    pub const EXCLUDED_WEEKDAYS: &str = "excluded_weekdays";

    // 监考
    pub const SUPERVISOR_STUDENT_RATIO: &str = "supervisor_student_ratio";
    pub const MIN_SUPERVISORS_PER_EXAM: &str = "min_supervisors_per_exam";
    pub const DEFAULT_MAX_EXAMS_PER_DAY: &str = "default_max_exams_per_day";
    pub const DEPT_MATCH_BONUS: &str = "dept_match_bonus";
    pub const LOAD_PENALTY_WEIGHT: &str = "load_penalty_weight";

    // 排期
    pub const FALLBACK_EXPECTED_STUDENTS: &str = "fallback_expected_students";

    // 审计
    pub const STUDENT_CONFLICT_REPORT_CAP: &str = "student_conflict_report_cap";
}
