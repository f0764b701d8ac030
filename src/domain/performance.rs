// ==========================================
// 剧团排班系统 - 演出领域模型
// ==========================================
// 对齐: performances 表
// 红线: 角色身份 = 完整字符串, 角色顺序即分配顺序
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Performance - 演出剧目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    pub id: i64,
    pub name: String,       // 剧目名称 (唯一)
    pub roles: Vec<String>, // 角色列表 (有序, 同剧目所有场次共享)
    pub notes: Option<String>,
}

impl Performance {
    /// 角色是否属于本剧目
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 角色在列表中的位置 (用于按剧目角色顺序展示)
    pub fn role_position(&self, role: &str) -> Option<usize> {
        self.roles.iter().position(|r| r == role)
    }
}

/// 新建剧目参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerformance {
    pub name: String,
    pub roles: Vec<String>,
    pub notes: Option<String>,
}
