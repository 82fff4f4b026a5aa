//! Prompt construction for the generative service

/// Builds the instruction text sent to the generative service
///
/// Pure and deterministic: the same song and song count always produce the
/// same prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    song_count: usize,
}

impl PromptBuilder {
    pub fn new(song_count: usize) -> Self {
        Self { song_count }
    }

    pub fn song_count(&self) -> usize {
        self.song_count
    }

    /// Build the prompt for one reference song
    pub fn build(&self, song: &str) -> String {
        let song = song.trim().replace('"', "\\\"");

        format!(
            r#"Generate a curated playlist of {count} songs similar to "{song}".
Return only a JSON array of {count} objects with the following structure:
{{
  "name": "Song Name",
  "artist": "Artist Name",
  "album": "Album Name",
  "year": "1234",
  "genres": ["Genre1", "Genre2"],
  "explanation": "Brief explanation of why this song fits"
}}
Rules:
- Output only the JSON array. No text before or after it, no markdown, no code fences.
- Do not include more than one song by the same artist.
- Maximize genre diversity across the playlist."#,
            count = self.song_count,
            song = song,
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_song_and_count() {
        let prompt = PromptBuilder::new(15).build("Bohemian Rhapsody");

        assert!(prompt.contains("15 songs similar to \"Bohemian Rhapsody\""));
        assert!(prompt.contains("\"genres\""));
        assert!(prompt.contains("\"explanation\""));
    }

    #[test]
    fn test_prompt_forbids_prose_and_duplicates() {
        let prompt = PromptBuilder::default().build("Heroes");

        assert!(prompt.contains("Output only the JSON array"));
        assert!(prompt.contains("no code fences"));
        assert!(prompt.contains("same artist"));
        assert!(prompt.contains("genre diversity"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let builder = PromptBuilder::new(10);
        assert_eq!(builder.build("Karma Police"), builder.build("Karma Police"));
    }

    #[test]
    fn test_prompt_escapes_quotes() {
        let prompt = PromptBuilder::new(10).build(r#"Song "2""#);
        assert!(prompt.contains(r#"similar to "Song \"2\"""#));
    }
}
