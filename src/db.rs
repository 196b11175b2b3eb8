use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::curriculum;
use crate::error::{AppError, Result};
use crate::models::{
    CategoryCount, CompletionStat, CourseItem, CourseTarget, ErrorCategory, MasteryLevel,
    MistakeDraft, MistakeRecord, MistakeSummary, Period, Recommendation, ResourceKind,
    ReviewOutcome, Subject,
};

/// Upper bound on an attached question image.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

const INCOMPLETE_RECOMMENDATION_LIMIT: i64 = 3;
const HOTSPOT_RECOMMENDATION_LIMIT: i64 = 2;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS courses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject TEXT NOT NULL,
                chapter TEXT NOT NULL,
                resource TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT,
                sort_order INTEGER NOT NULL,
                UNIQUE(subject, chapter, resource)
            );

            CREATE TABLE IF NOT EXISTS mistakes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject TEXT NOT NULL,
                chapter TEXT NOT NULL,
                question TEXT NOT NULL DEFAULT '',
                image BLOB,
                error_type TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '',
                mastery_level INTEGER NOT NULL DEFAULT 0,
                probability REAL NOT NULL DEFAULT 1.0,
                created_at TEXT NOT NULL,
                last_reviewed TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_courses_subject ON courses(subject);
            CREATE INDEX IF NOT EXISTS idx_mistakes_created ON mistakes(created_at);
            CREATE INDEX IF NOT EXISTS idx_mistakes_subject_chapter ON mistakes(subject, chapter);
            "#,
        )?;
        Ok(())
    }

    // Course operations

    /// Insert-if-absent over the fixed curriculum, keyed on the
    /// (subject, chapter, resource) triple. Safe to run on every startup.
    pub fn seed_curriculum(&self) -> Result<usize> {
        let mut inserted = 0;
        for subject in Subject::ALL {
            for &(chapter, order) in curriculum::chapters(subject) {
                for resource in curriculum::RESOURCE_KINDS {
                    inserted += self.conn.execute(
                        r#"
                        INSERT OR IGNORE INTO courses (subject, chapter, resource, sort_order)
                        VALUES (?1, ?2, ?3, ?4)
                        "#,
                        params![subject.as_str(), chapter, resource.as_str(), order],
                    )?;
                }
            }
        }
        if inserted > 0 {
            log::info!("seeded {} course items", inserted);
        }
        Ok(inserted)
    }

    /// The full hierarchy for display: subjects in curriculum order, then
    /// chapter order, then seeding order within a chapter (slides first).
    pub fn list_courses(&self) -> Result<Vec<CourseItem>> {
        let mut items = Vec::new();
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, subject, chapter, resource, completed, last_updated, sort_order
            FROM courses
            WHERE subject = ?1
            ORDER BY sort_order, id
            "#,
        )?;
        for subject in Subject::ALL {
            let rows = stmt.query_map(params![subject.as_str()], Self::map_course)?;
            for row in rows {
                items.push(row?);
            }
        }
        Ok(items)
    }

    pub fn list_chapters(&self, subject: Subject) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT chapter
            FROM courses
            WHERE subject = ?1
            GROUP BY chapter
            ORDER BY MIN(sort_order)
            "#,
        )?;
        let rows = stmt.query_map(params![subject.as_str()], |row| row.get(0))?;
        let chapters = rows.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(chapters)
    }

    /// Flip the completion flag of a leaf resource and stamp the update
    /// time. Partial targets (subject or chapter level) are rejected.
    pub fn toggle_completion(&self, target: &CourseTarget) -> Result<CourseItem> {
        let (chapter, resource) = target
            .leaf()
            .ok_or_else(|| AppError::InvalidTarget(target.describe()))?;

        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            r#"
            UPDATE courses
            SET completed = 1 - completed, last_updated = ?1
            WHERE subject = ?2 AND chapter = ?3 AND resource = ?4
            "#,
            params![now, target.subject.as_str(), chapter, resource.as_str()],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!(
                "course item {}",
                target.describe()
            )));
        }

        self.get_course(target.subject, chapter, resource)
    }

    fn get_course(
        &self,
        subject: Subject,
        chapter: &str,
        resource: ResourceKind,
    ) -> Result<CourseItem> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, subject, chapter, resource, completed, last_updated, sort_order
            FROM courses
            WHERE subject = ?1 AND chapter = ?2 AND resource = ?3
            "#,
        )?;
        let item = stmt
            .query_row(
                params![subject.as_str(), chapter, resource.as_str()],
                Self::map_course,
            )
            .optional()?;
        item.ok_or_else(|| {
            AppError::NotFound(format!(
                "course item {}/{}/{}",
                subject.as_str(),
                chapter,
                resource.as_str()
            ))
        })
    }

    fn map_course(row: &rusqlite::Row) -> rusqlite::Result<CourseItem> {
        let subject_str: String = row.get(1)?;
        let resource_str: String = row.get(3)?;
        Ok(CourseItem {
            id: row.get(0)?,
            subject: Subject::from_str(&subject_str).unwrap_or(Subject::PhysicalChemistry),
            chapter: row.get(2)?,
            resource: ResourceKind::from_str(&resource_str).unwrap_or(ResourceKind::Slides),
            completed: row.get::<_, i64>(4)? != 0,
            last_updated: row.get(5)?,
            sort_order: row.get(6)?,
        })
    }

    // Mistake operations

    /// Validate and persist a new mistake. Chapter and error category must
    /// be non-blank; an image, if attached, must fit the size cap.
    pub fn submit_mistake(&self, subject: Subject, draft: &MistakeDraft) -> Result<i64> {
        let chapter = draft.chapter.trim();
        if chapter.is_empty() {
            return Err(AppError::missing_field("chapter"));
        }
        let category = ErrorCategory::parse(&draft.category)
            .ok_or_else(|| AppError::missing_field("error category"))?;
        if let Some(image) = &draft.image {
            if image.len() > MAX_IMAGE_BYTES {
                return Err(AppError::Validation(format!(
                    "image is {} bytes, over the {} byte limit",
                    image.len(),
                    MAX_IMAGE_BYTES
                )));
            }
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO mistakes (subject, chapter, question, image, error_type, tags,
                                  mastery_level, probability, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1.0, ?7)
            "#,
            params![
                subject.as_str(),
                chapter,
                draft.question,
                draft.image,
                category.as_str(),
                draft.tags,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_mistake(&self, id: i64) -> Result<MistakeRecord> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, subject, chapter, question, image, error_type, tags,
                   mastery_level, probability, created_at, last_reviewed
            FROM mistakes
            WHERE id = ?1
            "#,
        )?;
        let record = stmt.query_row(params![id], Self::map_mistake).optional()?;
        record.ok_or_else(|| AppError::NotFound(format!("mistake {}", id)))
    }

    /// Listing rows without the image payload, most recently reviewed
    /// first; never-reviewed records sort last.
    pub fn list_mistakes(&self) -> Result<Vec<MistakeSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, subject, chapter, error_type, mastery_level, created_at, last_reviewed
            FROM mistakes
            ORDER BY last_reviewed DESC, id DESC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let subject_str: String = row.get(1)?;
            Ok(MistakeSummary {
                id: row.get(0)?,
                subject: Subject::from_str(&subject_str).unwrap_or(Subject::PhysicalChemistry),
                chapter: row.get(2)?,
                error_category: row.get(3)?,
                mastery_level: MasteryLevel::from_i64(row.get(4)?),
                created_at: row.get(5)?,
                last_reviewed: row.get(6)?,
            })
        })?;
        let summaries = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Weighted random pick over the review pool: each record's chance is
    /// proportional to its recall probability, so due records dominate but
    /// mastered ones stay reachable.
    pub fn select_for_review(&self) -> Result<Option<MistakeRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, subject, chapter, question, image, error_type, tags,
                   mastery_level, probability, created_at, last_reviewed
            FROM mistakes
            WHERE probability > 0
            "#,
        )?;
        let rows = stmt.query_map([], Self::map_mistake)?;
        let pool = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        if pool.is_empty() {
            return Ok(None);
        }

        use rand::Rng;
        let mut rng = rand::thread_rng();

        let total_weight: f64 = pool.iter().map(|m| m.probability).sum();
        let mut random_point = rng.gen::<f64>() * total_weight;

        for (i, record) in pool.iter().enumerate() {
            random_point -= record.probability;
            if random_point <= 0.0 {
                log::debug!(
                    "serving mistake {} (weight {:.2} of {:.2})",
                    record.id,
                    record.probability,
                    total_weight
                );
                return Ok(Some(pool[i].clone()));
            }
        }

        // Fallback to first
        Ok(pool.into_iter().next())
    }

    /// Apply a review outcome: set the mastery level, recompute the recall
    /// probability, and stamp the review time.
    pub fn record_review_outcome(&self, id: i64, outcome: ReviewOutcome) -> Result<MistakeRecord> {
        let mastery = outcome.mastery();
        let probability = Self::recall_after(mastery);
        let now = Utc::now().to_rfc3339();

        let changed = self.conn.execute(
            r#"
            UPDATE mistakes
            SET mastery_level = ?1, probability = ?2, last_reviewed = ?3
            WHERE id = ?4
            "#,
            params![mastery.as_i64(), probability, now, id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("mistake {}", id)));
        }

        self.get_mistake(id)
    }

    // Recall weight per mastery level: 0.4 off per step, floored at 0.1 so
    // no record ever leaves the review pool.
    fn recall_after(mastery: MasteryLevel) -> f64 {
        match mastery {
            MasteryLevel::Unseen => 1.0,
            MasteryLevel::NeedsReview => 0.5,
            MasteryLevel::Mastered => 0.1,
        }
    }

    pub fn delete_mistake(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM mistakes WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("mistake {}", id)));
        }
        log::debug!("deleted mistake {}", id);
        Ok(())
    }

    fn map_mistake(row: &rusqlite::Row) -> rusqlite::Result<MistakeRecord> {
        let subject_str: String = row.get(1)?;
        Ok(MistakeRecord {
            id: row.get(0)?,
            subject: Subject::from_str(&subject_str).unwrap_or(Subject::PhysicalChemistry),
            chapter: row.get(2)?,
            question: row.get(3)?,
            image: row.get(4)?,
            error_category: row.get(5)?,
            tags: row.get(6)?,
            mastery_level: MasteryLevel::from_i64(row.get(7)?),
            probability: row.get(8)?,
            created_at: row.get(9)?,
            last_reviewed: row.get(10)?,
        })
    }

    // Analytics operations

    /// Mistake counts grouped by error category within the period. An empty
    /// result is a valid "no data" state.
    pub fn error_type_distribution(&self, period: Period) -> Result<Vec<CategoryCount>> {
        let cutoff = period.cutoff(Utc::now()).map(|t| t.to_rfc3339());

        let (query, params_vec): (String, Vec<Box<dyn rusqlite::ToSql>>) = match cutoff {
            Some(cutoff) => (
                r#"
                SELECT error_type, COUNT(*)
                FROM mistakes
                WHERE created_at >= ?1
                GROUP BY error_type
                ORDER BY COUNT(*) DESC, error_type ASC
                "#
                .to_string(),
                vec![Box::new(cutoff)],
            ),
            None => (
                r#"
                SELECT error_type, COUNT(*)
                FROM mistakes
                GROUP BY error_type
                ORDER BY COUNT(*) DESC, error_type ASC
                "#
                .to_string(),
                vec![],
            ),
        };

        let mut stmt = self.conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let counts = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }

    /// Per-subject completion percentage, rounded to one decimal place.
    pub fn completion_by_course(&self) -> Result<Vec<CompletionStat>> {
        let mut stats = Vec::new();
        for subject in Subject::ALL {
            let (completed, total): (i64, i64) = self.conn.query_row(
                "SELECT COALESCE(SUM(completed), 0), COUNT(*) FROM courses WHERE subject = ?1",
                params![subject.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let percent = if total == 0 {
                0.0
            } else {
                (1000.0 * completed as f64 / total as f64).round() / 10.0
            };
            stats.push(CompletionStat {
                subject,
                completed,
                total,
                percent,
            });
        }
        Ok(stats)
    }

    /// Next-action suggestions: up to three incomplete course items in
    /// curriculum order, then up to two mistake hotspots within the period.
    pub fn recommendations(&self, period: Period) -> Result<Vec<Recommendation>> {
        let mut recs = Vec::new();

        let mut stmt = self.conn.prepare(
            r#"
            SELECT subject, chapter, resource
            FROM courses
            WHERE completed = 0
            ORDER BY sort_order ASC, id ASC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![INCOMPLETE_RECOMMENDATION_LIMIT], |row| {
            let subject_str: String = row.get(0)?;
            let resource_str: String = row.get(2)?;
            Ok(Recommendation::Course {
                subject: Subject::from_str(&subject_str).unwrap_or(Subject::PhysicalChemistry),
                chapter: row.get(1)?,
                resource: ResourceKind::from_str(&resource_str).unwrap_or(ResourceKind::Slides),
            })
        })?;
        for row in rows {
            recs.push(row?);
        }

        let cutoff = period.cutoff(Utc::now()).map(|t| t.to_rfc3339());
        let (query, params_vec): (String, Vec<Box<dyn rusqlite::ToSql>>) = match cutoff {
            Some(cutoff) => (
                r#"
                SELECT subject, chapter, COUNT(*)
                FROM mistakes
                WHERE created_at >= ?1
                GROUP BY subject, chapter
                ORDER BY COUNT(*) DESC, chapter ASC
                LIMIT ?2
                "#
                .to_string(),
                vec![Box::new(cutoff), Box::new(HOTSPOT_RECOMMENDATION_LIMIT)],
            ),
            None => (
                r#"
                SELECT subject, chapter, COUNT(*)
                FROM mistakes
                GROUP BY subject, chapter
                ORDER BY COUNT(*) DESC, chapter ASC
                LIMIT ?1
                "#
                .to_string(),
                vec![Box::new(HOTSPOT_RECOMMENDATION_LIMIT)],
            ),
        };

        let mut stmt = self.conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            let subject_str: String = row.get(0)?;
            Ok(Recommendation::MistakeHotspot {
                subject: Subject::from_str(&subject_str).unwrap_or(Subject::PhysicalChemistry),
                chapter: row.get(1)?,
                count: row.get(2)?,
            })
        })?;
        for row in rows {
            recs.push(row?);
        }

        Ok(recs)
    }
}
