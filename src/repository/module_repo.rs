use crate::db::open_sqlite_connection;
use crate::domain::module::{Formation, Module};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ModuleRepository - 课程仓储
// ==========================================
/// 课程/专业仓储
/// 职责: 管理 module / formation / department 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ModuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ModuleRepository {
    /// 创建新的 ModuleRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入院系（数据准备/测试用）
    pub fn insert_department(&self, department_id: &str, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO department (department_id, name) VALUES (?1, ?2)",
            params![department_id, name],
        )?;
        Ok(())
    }

    /// 插入专业（数据准备/测试用）
    pub fn insert_formation(&self, formation: &Formation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO formation (formation_id, department_id, name, academic_year)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                formation.formation_id,
                formation.department_id,
                formation.name,
                formation.academic_year,
            ],
        )?;
        Ok(())
    }

    /// 插入课程（数据准备/测试用）
    pub fn insert_module(&self, module: &Module) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO module (
                module_id, formation_id, name, code,
                exam_duration_minutes, requires_computer, requires_lab, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                module.module_id,
                module.formation_id,
                module.name,
                module.code,
                module.exam_duration_minutes,
                module.requires_computer,
                module.requires_lab,
                module.is_active,
            ],
        )?;
        Ok(())
    }

    /// 查询某学年的所有启用课程（批次准备输入）
    ///
    /// # 说明
    /// - 学年口径来自课程所属专业 (formation.academic_year)
    pub fn list_active_by_academic_year(
        &self,
        academic_year: &str,
    ) -> RepositoryResult<Vec<Module>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                m.module_id, m.formation_id, m.name, m.code,
                m.exam_duration_minutes, m.requires_computer, m.requires_lab, m.is_active
            FROM module m
            JOIN formation f ON m.formation_id = f.formation_id
            WHERE f.academic_year = ?1 AND m.is_active = 1
            ORDER BY m.code
            "#,
        )?;

        let modules = stmt
            .query_map(params![academic_year], map_module_row)?
            .collect::<SqliteResult<Vec<Module>>>()?;

        Ok(modules)
    }

    /// 批量查询 课程ID -> 院系ID 映射（监考亲和评分用）
    ///
    /// # 说明
    /// - 链路: module -> formation -> department
    pub fn module_department_map(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.module_id, f.department_id
            FROM module m
            JOIN formation f ON m.formation_id = f.formation_id
            "#,
        )?;

        let mut map = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (module_id, department_id) = row?;
            map.insert(module_id, department_id);
        }

        Ok(map)
    }
}

/// module 行映射
fn map_module_row(row: &rusqlite::Row<'_>) -> SqliteResult<Module> {
    Ok(Module {
        module_id: row.get(0)?,
        formation_id: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        exam_duration_minutes: row.get(4)?,
        requires_computer: row.get(5)?,
        requires_lab: row.get(6)?,
        is_active: row.get(7)?,
    })
}
