//! Label variants Workday tenants use for the same answer.
//!
//! Each entry maps an alias (compared after normalization) to the canonical
//! profile key. When a label contains several aliases the longest one wins;
//! table order only breaks ties.

pub const SYNONYMS: &[(&str, &str)] = &[
    ("Email Address", "email"),
    ("E-mail", "email"),
    ("Given Name", "first_name"),
    ("First Name", "first_name"),
    ("Family Name", "last_name"),
    ("Surname", "last_name"),
    ("Last Name", "last_name"),
    ("Preferred Name", "preferred_name"),
    ("Address Line 1", "address_line1"),
    ("Street Address", "address_line1"),
    ("Address Line 2", "address_line2"),
    ("City", "city"),
    ("Town", "city"),
    ("State", "state"),
    ("Province", "state"),
    ("Postal Code", "postal_code"),
    ("Zip Code", "postal_code"),
    ("Zip", "postal_code"),
    ("County", "county"),
    ("Country Phone Code", "country"),
    ("Country", "country"),
    ("Phone Device Type", "phone_type"),
    ("Phone Type", "phone_type"),
    ("Phone Number", "phone_number"),
    ("Mobile Number", "phone_number"),
    ("Phone Extension", "phone_extension"),
    ("How Did You Hear About Us", "hear_about_us"),
    ("Source", "hear_about_us"),
    ("Previously Worked", "previous_worker"),
    ("Previously Been Employed", "previous_worker"),
    ("Legally Authorized", "authorization"),
    ("Authorized To Work", "authorization"),
    ("Work Authorization", "authorization"),
    ("Sponsorship", "sponsorship"),
    ("Nationality", "nationality"),
    ("Gender", "gender"),
    ("Ethnicity", "ethnicity"),
    ("Race", "ethnicity"),
    ("Veteran", "veteran_status"),
    ("Disability", "disability"),
    ("Terms and Conditions", "consent"),
    ("I Agree", "consent"),
    ("I Understand", "consent"),
    ("Consent", "consent"),
    ("Resume", "resume"),
    ("Curriculum Vitae", "resume"),
    ("Cover Letter", "cover_letter"),
    ("LinkedIn", "linkedin"),
    ("Website", "website"),
];
