//! Prompt templates for the planner and both writer waves.

use crate::provider::ChatMessage;
use crate::story::section::Section;

pub const DEFAULT_STRUCTURE_TEMPLATE: &str = "The campaign story follows this adventure structure:

1. Prologue: The Gathering (1 section, not main body)
   - An ominous opening scene or prophecy
   - First glimpse of the world and the threat rising in it
   - The call to adventure that draws the heroes together
   - 200-300 words of atmospheric storytelling

2. Main Campaign Chapters (3 sections, main body)
   Chapter 1: The Heroes
      * Three characters (Wizard, Rogue, Fighter) in detail
      * Backgrounds, motivations and how their paths cross
      * Character sheets and starting equipment
      * 400-500 words
   Chapter 2: The World Awakens
      * Setting and starting location
      * Local NPCs and factions
      * Sights, sounds and atmosphere
      * 400-500 words
   Chapter 3: Quests and Perils
      * The main quest revealed
      * A side quest for each character
      * Encounters and combat scenarios
      * 400-500 words

3. Epilogue: Destiny Awaits (1 section, not main body)
   - The climactic battle or challenge
   - Resolution and how the characters have grown
   - Hooks for future adventures
   - 200-300 words of epic conclusion";

const PLANNER_SYSTEM: &str = "You are an expert Dungeon Master. Produce a structured outline \
for a D&D campaign story from the notes and structure you are given.";

const PLANNER_TEMPLATE: &str = "You are planning an epic D&D campaign story for a party of three adventurers.

Read these campaign notes first:
{notes}

Organise the story into sections following this structure:
{structure}

Each section needs:
- name: a chapter title, unique within the outline (e.g. \"Chapter 1: The Heroes Unite\")
- description: what happens in the section (introductions, exploration, quest reveals, encounters)
- content: always an empty string
- main_body: true for main story chapters, false for the prologue and epilogue

Make sure the outline covers characters, world, quests and encounters and reads as one
cohesive adventure with a clear arc.

Respond with a single valid JSON object in exactly this shape:
{
    \"sections\": [
        {
            \"name\": \"Section Name\",
            \"description\": \"What this section covers\",
            \"content\": \"\",
            \"main_body\": true
        }
    ]
}";

const BODY_SYSTEM_TEMPLATE: &str = "You are an expert Dungeon Master writing one chapter of an epic D&D campaign story.

Campaign notes for context:
{notes}

Chapter to write:
{section_name}

What happens in this chapter:
{section_description}

Additional campaign resources (may be empty):
{references}

Storytelling guidelines:
- Vivid, immersive third-person fantasy prose with dialogue and tension
- Markdown: ## for the chapter heading, ### for sub-sections such as character sheets or
  locations, **bold** for a character's first mention, *italics* for thoughts, > for NPC
  dialogue, - for equipment and spell lists
- Weave in D&D detail: descriptions and personalities, sensory setting detail, NPC
  interaction, encounters with challenge ratings, skill checks with DCs, treasure and
  magic items, plot hooks
- Character chapters give name, race, class, level, background, traits, equipment and a
  personal quest
- World and quest chapters give locations, politics and factions, objectives and rewards,
  and environmental hazards";

const BODY_USER: &str = "Write this chapter of the campaign story with vivid descriptions, \
character detail and an engaging narrative.";

const FRAMING_SYSTEM_TEMPLATE: &str = "You are an expert Dungeon Master writing the prologue or epilogue of an epic D&D campaign.

Section to write:
{section_name}

What this section covers:
{section_description}

The main story chapters, for continuity:
{body}

Additional resources (may be empty):
{references}

Guidelines:
- Atmospheric fantasy prose that sets the mood and builds anticipation
- A prologue opens with '# <Campaign Title>', a hooking scene, a mysterious event or
  prophecy, the heroes gathering and the inciting incident; it foreshadows the chapters
- An epilogue opens with '## Epilogue: <Title>', resolves the main quest, shows how each
  character grew, plants seeds for future adventures and ends on a memorable scene; it
  calls back to the chapters
- Give NPCs a voice and make the stakes clear";

const FRAMING_USER: &str = "Craft this prologue or epilogue so it sets the mood and draws the \
players into the story.";

/// Substitute `{key}` placeholders in one pass so substituted text is never re-scanned.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn planner_messages(notes: &str, structure: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(PLANNER_SYSTEM),
        ChatMessage::user(render(
            PLANNER_TEMPLATE,
            &[("notes", notes), ("structure", structure)],
        )),
    ]
}

pub fn body_writer_messages(section: &Section, notes: &str, references: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(render(
            BODY_SYSTEM_TEMPLATE,
            &[
                ("notes", notes),
                ("section_name", section.name.as_str()),
                ("section_description", section.description.as_str()),
                ("references", references),
            ],
        )),
        ChatMessage::user(BODY_USER),
    ]
}

pub fn framing_writer_messages(
    section: &Section,
    body_context: &str,
    references: &str,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(render(
            FRAMING_SYSTEM_TEMPLATE,
            &[
                ("section_name", section.name.as_str()),
                ("section_description", section.description.as_str()),
                ("body", body_context),
                ("references", references),
            ],
        )),
        ChatMessage::user(FRAMING_USER),
    ]
}
