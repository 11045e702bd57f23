use crate::models::{NewPosition, Position, Skill};

use super::FormData;

pub const TOTAL_FORMS: &str = "form-TOTAL_FORMS";
const MAX_FORMS: usize = 1000;
const MAX_INFORMATION: usize = 500;
const MAX_TIME_COMMITMENT: usize = 100;

/// One row of the positions formset as submitted by the browser.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PositionRow {
    pub skill: String,
    pub information: String,
    pub time_commitment: String,
    pub errors: Vec<String>,
}

impl PositionRow {
    fn is_blank(&self) -> bool {
        self.skill.trim().is_empty()
            && self.information.trim().is_empty()
            && self.time_commitment.trim().is_empty()
    }

    pub fn selected(&self, skill: &Skill) -> bool {
        self.skill.trim() == skill.pk.to_string()
    }

    fn clean(&mut self, skills: &[Skill]) -> Option<NewPosition> {
        self.errors.clear();

        let skill_pk = match self.skill.trim() {
            "" => {
                self.errors.push("Select a skill.".into());
                None
            }
            value => match value.parse::<i64>() {
                Ok(pk) if skills.iter().any(|s| s.pk == pk) => Some(pk),
                _ => {
                    self.errors.push("Select a valid skill.".into());
                    None
                }
            },
        };

        let information = self.information.trim();
        if information.is_empty() {
            self.errors.push("The information is required.".into());
        } else if information.chars().count() > MAX_INFORMATION {
            self.errors.push(format!(
                "Ensure the information has at most {} characters.",
                MAX_INFORMATION
            ));
        }

        let time_commitment = self.time_commitment.trim();
        if time_commitment.chars().count() > MAX_TIME_COMMITMENT {
            self.errors.push(format!(
                "Ensure the time commitment has at most {} characters.",
                MAX_TIME_COMMITMENT
            ));
        }

        if !self.errors.is_empty() {
            return None;
        }

        skill_pk.map(|skill_pk| NewPosition {
            skill_pk,
            information: information.to_owned(),
            time_commitment: time_commitment.to_owned(),
        })
    }
}

/// Positions encoded as `form-N-skill`, `form-N-information` and
/// `form-N-time_commitment`, with `form-TOTAL_FORMS` giving the row count.
#[derive(Debug, Default, Clone)]
pub struct PositionsFormset {
    pub rows: Vec<PositionRow>,
}

impl PositionsFormset {
    pub fn from_form(form: &FormData) -> Self {
        let total = form
            .get(TOTAL_FORMS)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or_else(|| count_rows(form))
            .min(MAX_FORMS);

        let rows = (0..total)
            .map(|i| PositionRow {
                skill: form.get_or_empty(&field_name(i, "skill")),
                information: form.get_or_empty(&field_name(i, "information")),
                time_commitment: form.get_or_empty(&field_name(i, "time_commitment")),
                errors: Vec::new(),
            })
            .collect();

        Self { rows }
    }

    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Self {
        let rows = positions
            .into_iter()
            .map(|p| PositionRow {
                skill: p.skill_pk.to_string(),
                information: p.information.clone(),
                time_commitment: p.time_commitment.clone(),
                errors: Vec::new(),
            })
            .collect();
        Self { rows }
    }

    /// Adds an empty row so a new position can be entered without scripts.
    pub fn with_blank_row(mut self) -> Self {
        self.rows.push(PositionRow::default());
        self
    }

    pub fn total_forms(&self) -> usize {
        self.rows.len()
    }

    /// Validates every non blank row. Errors are attached to their rows and
    /// `None` is returned when any row is invalid.
    pub fn clean(&mut self, skills: &[Skill]) -> Option<Vec<NewPosition>> {
        self.rows.retain(|row| !row.is_blank());

        let mut positions = Vec::with_capacity(self.rows.len());
        let mut valid = true;
        for row in self.rows.iter_mut() {
            match row.clean(skills) {
                Some(position) => positions.push(position),
                None => valid = false,
            }
        }

        valid.then_some(positions)
    }
}

pub fn field_name(index: usize, field: &str) -> String {
    format!("form-{}-{}", index, field)
}

fn count_rows(form: &FormData) -> usize {
    (0..MAX_FORMS)
        .take_while(|i| {
            form.get(&field_name(*i, "skill")).is_some()
                || form.get(&field_name(*i, "information")).is_some()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills() -> Vec<Skill> {
        vec![
            Skill {
                pk: 1,
                name: "Designer".into(),
            },
            Skill {
                pk: 2,
                name: "Python Developer".into(),
            },
        ]
    }

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let data = form(&[
            ("form-TOTAL_FORMS", "2"),
            ("form-0-skill", "1"),
            ("form-0-information", "Logo and branding"),
            ("form-0-time_commitment", "5h/week"),
            ("form-1-skill", ""),
            ("form-1-information", ""),
            ("form-1-time_commitment", ""),
        ]);
        let mut formset = PositionsFormset::from_form(&data);
        let positions = formset.clean(&skills()).unwrap();

        assert_eq!(
            positions,
            vec![NewPosition {
                skill_pk: 1,
                information: "Logo and branding".into(),
                time_commitment: "5h/week".into(),
            }]
        );
    }

    #[test]
    fn test_row_with_skill_but_no_information_is_invalid() {
        let data = form(&[
            ("form-TOTAL_FORMS", "1"),
            ("form-0-skill", "2"),
            ("form-0-information", "  "),
        ]);
        let mut formset = PositionsFormset::from_form(&data);

        assert!(formset.clean(&skills()).is_none());
        assert_eq!(formset.rows[0].errors, vec!["The information is required."]);
    }

    #[test]
    fn test_unknown_skill_is_invalid() {
        let data = form(&[
            ("form-TOTAL_FORMS", "1"),
            ("form-0-skill", "99"),
            ("form-0-information", "Backend"),
        ]);
        let mut formset = PositionsFormset::from_form(&data);

        assert!(formset.clean(&skills()).is_none());
        assert_eq!(formset.rows[0].errors, vec!["Select a valid skill."]);
    }

    #[test]
    fn test_rows_are_counted_when_total_is_missing() {
        let data = form(&[
            ("form-0-skill", "1"),
            ("form-0-information", "a"),
            ("form-1-skill", "2"),
            ("form-1-information", "b"),
        ]);
        let formset = PositionsFormset::from_form(&data);
        assert_eq!(formset.total_forms(), 2);
        assert_eq!(formset.with_blank_row().total_forms(), 3);
    }
}
