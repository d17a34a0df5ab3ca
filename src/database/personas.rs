use async_trait::async_trait;
use sqlx::types::Json;

use super::Database;
use crate::models::PersonaProfile;
use crate::stores::PersonaStore;
use crate::Result;

type PersonaRow = (String, String, Json<Vec<String>>, Json<Vec<String>>, Option<String>);

#[async_trait]
impl PersonaStore for Database {
    async fn load_persona(&self, persona_key: &str) -> Result<Option<PersonaProfile>> {
        let row = sqlx::query_as::<_, PersonaRow>(
            r"
            SELECT personality, tone, voice_examples, avoid_list, signature
            FROM personas
            WHERE persona_key = $1
            ",
        )
        .bind(persona_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(personality, tone, Json(voice_examples), Json(avoid_list), signature)| PersonaProfile {
                personality,
                tone,
                voice_examples,
                avoid_list,
                signature,
            },
        ))
    }
}
