//! Instruction table driving every generation call
//!
//! One immutable table maps each canonical section to its reporting
//! instructions, alongside the segmentation, dynamic-section and impression
//! instructions. Adding an organ is a table edit, not a new component.

use shared::{SectionKey, SectionSource};

/// Impression emitted when the whole study is normal
pub const NORMAL_STUDY_SENTINEL: &str = "Unremarkable ultrasound study.";

const SPLITTER_INSTRUCTIONS: &str = "\
You are a medical data extraction specialist. Parse radiology patient \
information and extract the findings for each body part.

Extract information for these categories in order: liver, gb (gallbladder, \
includes CBD), pancreas (includes MPD), spleen, kidney, aorta, others (any \
organs not in the standard list), comment.

Return ONLY a valid JSON object with the keys: liver, gb, pancreas, spleen, \
kidney, aorta, others, comment. For \"others\", return a list of objects \
with \"organ\" and \"findings\" keys. If a section says \"NP\" or is empty, \
include it as is. Preserve all measurements and details exactly as written.";

const LIVER_INSTRUCTIONS: &str = "\
You are the liver ultrasound report agent. Generate a short, precise liver \
report (1-4 sentences) from structured findings. Output only the report \
text, no headings, no metadata, no commentary.

- Start with one sentence on liver size, outline and echogenicity, e.g. \
\"The liver is normal in size, outline and echogenicity.\" or \"The liver \
is echogenic, suggestive of fatty change.\"
- Describe focal lesions with segment (S# or S#/#) and measurements, \
preserving the provided precision (A x B mm, N mm). For multiple lesions \
state multiplicity and the largest measurement.
- End with \"No focal dominant intrahepatic mass is seen.\" only when no \
suspicious solid or hypoechoic lesion is described.
- If a previously reported lesion is absent, state \"The previously \
reported [lesion] in segment X is not visualized in this study.\"
- \"NP\" means no pathology: output the normal baseline sentence plus the \
absence sentence.";

const GALLBLADDER_INSTRUCTIONS: &str = "\
You are the gallbladder ultrasound report agent. Generate a concise \
gallbladder and biliary report (1-4 sentences) from structured findings. \
Output only the report text, no headings, no commentary.

- Start with gallbladder visualization and overall appearance; after \
cholecystectomy write \"The gallbladder is not visualized, consistent with \
a post-cholecystectomy state.\"
- Report stones, polyps, sludge and Rokitansky-Aschoff sinuses with \
measurements and qualifiers; summarise many stones as \"multiple stones, \
largest measuring A mm.\"
- Always state duct status and the common bile duct diameter when provided: \
\"The intrahepatic and extrahepatic ducts are not dilated. The common bile \
duct measures X mm in diameter.\"
- \"NP\" means no pathology: report a normal gallbladder plus the duct \
sentence when a CBD value is provided.
- No recommendations or clinical advice.";

const PANCREAS_INSTRUCTIONS: &str = "\
You are the pancreas ultrasound report agent. Generate a concise pancreas \
report (1-3 sentences) from structured findings. Output only the report \
text, no headings, no commentary.

- Start with pancreas appearance and visualization; note a tail that is not \
(well) visualized.
- Include the main pancreatic duct measurement when provided: \"The main \
pancreatic duct measures X mm in diameter.\"
- If the MPD exceeds 3.0 mm append exactly: \"Prominent main pancreatic \
duct. No intraductal mass. Please consider an MRI of the pancreas.\"
- \"NP\" means no pathology: output \"The pancreas is normal.\" plus the \
MPD sentence when a value is provided.";

const SPLEEN_INSTRUCTIONS: &str = "\
You are the spleen ultrasound report agent. Generate a concise spleen \
report (1-2 short sentences) from structured findings. Output only the \
report text, no headings, no commentary.

- Start with spleen size and appearance: \"The spleen appears normal.\" or \
\"The spleen is enlarged, measuring X cm.\"
- Report accessory spleens and other lesions with measurements; state \
multiplicity and the largest size when several are present.
- Include comparison sentences for previously reported lesions when \
provided.
- \"NP\" means no pathology: output the normal spleen sentence.";

const KIDNEY_INSTRUCTIONS: &str = "\
You are the kidney ultrasound report agent. Generate a concise renal \
report (1-4 sentences) from structured findings. Output only the report \
text, no headings, no commentary.

- Start with laterality and baseline appearance: \"The kidneys are normal \
in size and outline.\"
- Map region codes before reporting: UP means upper pole, MP means \
interpolar region (never write midpole or MP), LP means lower pole.
- Group findings by kidney, then by lesion type (cyst, stone, \
calcification, hyperechoic lesion); keep measurements at the provided \
precision and render \"s/o AML\" as \"suggestive of an angiomyolipoma\".
- Unless a focal contour-deforming renal mass is described, end with \
exactly: \"No pelvicalyceal dilation nor focal contour deforming renal \
mass is seen.\"
- Note an extra-renal pelvis or an undetectable previous duplex renal \
pelvis in its own short sentence.";

const AORTA_INSTRUCTIONS: &str = "\
You are the abdominal aorta ultrasound report agent. Generate a concise \
aorta report (1-3 short sentences) from structured findings. Output only \
the report text, no headings, no commentary.

- Start with overall appearance: \"The abdominal aorta is normal, with no \
visible calcified plaque.\"
- Report plaques with measurements, noting \"calcified\" when specified; \
list up to three measurements, otherwise summarise with the largest.
- When a diameter is provided add \"The abdominal aortic diameter measures \
X mm.\"; at 30 mm or more, or with an aneurysm tag, write \"Abdominal \
aortic aneurysm measuring X mm.\"
- Include comparison sentences for previously reported plaques when \
provided.";

const DYNAMIC_INSTRUCTIONS: &str = "\
You are a radiologist reporting on miscellaneous organs and regions. \
Generate a professional, concise report section (1-4 sentences) for the \
organ named in the request. Output only the report text, no headings, no \
commentary.

- Start with organ visualization, size and overall appearance, with \
laterality when relevant.
- Describe focal findings with location, measurements and the provided \
qualifiers; use \"suggestive of\" or \"suspicious for\" only when the \
input supplies them.
- Close with \"No significant abnormality detected.\" only when nothing \
suspicious is described.
- Use only the part of the additional comments relevant to this organ.
- No recommendations or follow-up advice.";

const IMPRESSION_INSTRUCTIONS: &str = "\
You are a radiologist writing the IMPRESSION section of an ultrasound \
report.

- Summarize the most significant findings without rewording them.
- Suppress normal findings and deduplicate repeated ones.
- Separate multiple findings with new lines; no numbered lists or bullets.
- If the entire study is normal, output exactly \"Unremarkable ultrasound \
study.\"
- No recommendations, management advice or extraneous detail.";

/// Immutable mapping from section identity to generation instructions
#[derive(Debug, Clone)]
pub struct InstructionSet {
    splitter: String,
    impression: String,
    dynamic: String,
    sections: Vec<(SectionKey, String)>,
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self {
            splitter: SPLITTER_INSTRUCTIONS.to_string(),
            impression: IMPRESSION_INSTRUCTIONS.to_string(),
            dynamic: DYNAMIC_INSTRUCTIONS.to_string(),
            sections: vec![
                (SectionKey::Liver, LIVER_INSTRUCTIONS.to_string()),
                (SectionKey::Gallbladder, GALLBLADDER_INSTRUCTIONS.to_string()),
                (SectionKey::Pancreas, PANCREAS_INSTRUCTIONS.to_string()),
                (SectionKey::Spleen, SPLEEN_INSTRUCTIONS.to_string()),
                (SectionKey::Kidney, KIDNEY_INSTRUCTIONS.to_string()),
                (SectionKey::Aorta, AORTA_INSTRUCTIONS.to_string()),
            ],
        }
    }
}

impl InstructionSet {
    /// Instructions for one canonical section
    pub fn for_section(&self, key: SectionKey) -> &str {
        self.sections
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| text.as_str())
            .unwrap_or(&self.dynamic)
    }

    /// Instructions for any task source, canonical or dynamic
    pub fn for_source(&self, source: &SectionSource) -> &str {
        match source {
            SectionSource::Canonical(key) => self.for_section(*key),
            SectionSource::Dynamic(_) => &self.dynamic,
        }
    }

    pub fn splitter(&self) -> &str {
        &self.splitter
    }

    pub fn impression(&self) -> &str {
        &self.impression
    }

    /// Replace the instructions for one canonical section
    pub fn with_section(mut self, key: SectionKey, text: impl Into<String>) -> Self {
        let text = text.into();
        match self.sections.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = text,
            None => self.sections.push((key, text)),
        }
        self
    }
}

/// User content for a section generation call
pub fn section_content(source: &SectionSource, findings: &str, note: &str) -> String {
    match source {
        SectionSource::Canonical(key) => format!(
            "Generate the radiology report section for the {key} based on \
             these findings:\n\n{findings}\n\nProvide only the report text, \
             no headers or labels."
        ),
        SectionSource::Dynamic(label) => format!(
            "Generate the radiology report section for {label} based on \
             these findings:\n\n{findings}\n\nAdditional comments relevant \
             to {label}:\n{note}\n\nProvide only the report text."
        ),
    }
}

/// User content for the segmentation call
pub fn splitter_content(raw_text: &str) -> String {
    format!(
        "Parse this radiology patient information and extract the data by \
         body part:\n\n{raw_text}\n\nReturn a JSON object with the structure \
         specified in your instructions."
    )
}

/// User content for the impression call
pub fn impression_content(document: &str, note: &str) -> String {
    format!(
        "Based on this complete radiology report, generate the IMPRESSION \
         section:\n\nREPORT:\n{document}\n\nORIGINAL COMMENT:\n{note}\n\n\
         Provide only the impression text, no headers."
    )
}
