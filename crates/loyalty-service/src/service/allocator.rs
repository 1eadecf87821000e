//! 卡号分配服务
//!
//! 处理注册时的卡号发放，包括：
//! - 在配置号段内从高到低扫描空闲卡号
//! - 号段耗尽时静默跳过（不阻塞注册）
//! - 可用量降到阈值时原子扩展号段
//!
//! ## 并发约定
//!
//! 扫描、插入与扩段在同一事务中执行，事务开头对配置单例行
//! 加 FOR UPDATE 锁，并发注册因此串行通过分配临界区；
//! customers.card 上的唯一索引兜底。

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::models::{Customer, NewCustomer};
use crate::repository::{CustomerRepository, SiteConfigRepository};
use loyalty_shared::error::Result;

/// 在号段内挑选空闲卡号
///
/// 从 card_end 向 card_start 倒序扫描（刻意设计：新扩出的号段先被用掉），
/// 没有空位时返回 None。
pub fn pick_free_card(card_start: i64, card_end: i64, used: &HashSet<i64>) -> Option<i64> {
    (card_start..=card_end).rev().find(|card| !used.contains(card))
}

/// 判断是否需要扩段
pub fn should_extend(available: i64, lower_limit: i64) -> bool {
    available <= lower_limit
}

/// 卡号分配服务
pub struct CardAllocator {
    pool: PgPool,
}

impl CardAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建用户并分配卡号
    ///
    /// 整个流程在一个事务中：锁配置行 → 扫描空闲卡号 → 按需扩段 → 插入用户。
    /// 预先带卡号的数据（如导入场景）不经过扫描与扩段。
    #[instrument(skip(self, new_customer), fields(email = %new_customer.email))]
    pub async fn create_customer(&self, mut new_customer: NewCustomer) -> Result<Customer> {
        let mut tx = self.pool.begin().await?;

        if new_customer.card.is_none() {
            let config = SiteConfigRepository::get_for_update(&mut tx).await?;

            let used: HashSet<i64> = CustomerRepository::used_cards_in_range_in_tx(
                &mut tx,
                config.card_start,
                config.card_end,
            )
            .await?
            .into_iter()
            .collect();

            new_customer.card = pick_free_card(config.card_start, config.card_end, &used);

            // 分配后余量（分配失败时 used 不变）
            let used_after = used.len() as i64 + i64::from(new_customer.card.is_some());
            let available = config.cards_count() - used_after;

            if should_extend(available, config.lower_limit) {
                let new_end =
                    SiteConfigRepository::extend_card_end_in_tx(&mut tx, config.increase_by)
                        .await?;
                info!(
                    available,
                    lower_limit = config.lower_limit,
                    new_card_end = new_end,
                    "可用卡号降到阈值，号段已扩展"
                );
            }
        }

        let customer = CustomerRepository::insert_in_tx(&mut tx, &new_customer).await?;

        tx.commit().await?;

        info!(
            customer_id = customer.id,
            card = ?customer.card,
            "用户已创建"
        );

        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(cards: &[i64]) -> HashSet<i64> {
        cards.iter().copied().collect()
    }

    #[test]
    fn test_pick_free_card_descends_from_end() {
        // 空号段：先发最大号
        assert_eq!(pick_free_card(1, 3, &used(&[])), Some(3));
    }

    #[test]
    fn test_pick_free_card_skips_taken() {
        // [1,5]，5 被占，1..4 空闲：下一张是 4
        assert_eq!(pick_free_card(1, 5, &used(&[5])), Some(4));
        // 高位连续被占时继续向下找
        assert_eq!(pick_free_card(1, 5, &used(&[5, 4, 3])), Some(2));
    }

    #[test]
    fn test_pick_free_card_exhausted() {
        assert_eq!(pick_free_card(1, 3, &used(&[1, 2, 3])), None);
    }

    #[test]
    fn test_pick_free_card_single_slot() {
        assert_eq!(pick_free_card(7, 7, &used(&[])), Some(7));
        assert_eq!(pick_free_card(7, 7, &used(&[7])), None);
    }

    #[test]
    fn test_should_extend_threshold() {
        assert!(!should_extend(2, 1));
        assert!(should_extend(1, 1));
        assert!(should_extend(0, 1));
    }

    /// 完整时序：号段 [1,3]，lower_limit=1，increase_by=10。
    /// 第一个用户拿到 3，余量 2，不扩段；继续注册直到余量 1 时扩段。
    #[test]
    fn test_worked_example_sequence() {
        let card_start = 1;
        let mut card_end = 3;
        let lower_limit = 1;
        let increase_by = 10;
        let mut taken = HashSet::new();
        let mut extensions = 0;

        // 第一个用户
        let card = pick_free_card(card_start, card_end, &taken).unwrap();
        assert_eq!(card, 3);
        taken.insert(card);
        let available = (card_end - card_start + 1) - taken.len() as i64;
        assert_eq!(available, 2);
        assert!(!should_extend(available, lower_limit));

        // 第二个用户：余量降到 1，触发扩段
        let card = pick_free_card(card_start, card_end, &taken).unwrap();
        assert_eq!(card, 2);
        taken.insert(card);
        let available = (card_end - card_start + 1) - taken.len() as i64;
        assert_eq!(available, 1);
        assert!(should_extend(available, lower_limit));
        card_end += increase_by;
        extensions += 1;

        assert_eq!(card_end, 13);
        assert_eq!(extensions, 1);

        // 扩段后优先发新号段里的最大号
        let card = pick_free_card(card_start, card_end, &taken).unwrap();
        assert_eq!(card, 13);
    }

    // ==================== 集成测试 ====================

    #[tokio::test]
    #[ignore] // 需要数据库连接：DATABASE_URL=postgres://... cargo test -- --ignored
    async fn test_concurrent_allocation_no_duplicates() {
        use crate::models::EmailStatus;

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        let allocator = std::sync::Arc::new(CardAllocator::new(pool.clone()));

        let mut handles = Vec::new();
        for i in 0..20 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator
                    .create_customer(NewCustomer {
                        created_at: None,
                        first_name: format!("F{i}"),
                        middle_name: format!("M{i}"),
                        last_name: format!("L{i}"),
                        email: format!("concurrent{i}@alloc.test"),
                        phone: format!("09{:08}", i),
                        insurance_end: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                        card: None,
                        email_status: EmailStatus::NotExist,
                        utm_link: None,
                    })
                    .await
            }));
        }

        let mut cards = HashSet::new();
        let mut ids = Vec::new();
        for handle in handles {
            let customer = handle.await.unwrap().unwrap();
            ids.push(customer.id);
            if let Some(card) = customer.card {
                // 任意两个用户不得拿到相同卡号
                assert!(cards.insert(card), "卡号重复: {card}");
            }
        }

        // 清理
        for id in ids {
            sqlx::query("DELETE FROM customers WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await
                .unwrap();
        }
    }
}
