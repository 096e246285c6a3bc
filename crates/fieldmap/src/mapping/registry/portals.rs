use chrono::NaiveDate;

use super::{FieldBinding, PortalProfile, RegistryError};
use crate::mapping::domain::{CanonicalKey, FormType, SelectorChain};
use crate::mapping::transform::TransformName;

use CanonicalKey::*;

type OptionSet = &'static [(&'static str, &'static str)];

struct PortalSeed {
    slug: &'static str,
    name: &'static str,
    registration_url: &'static str,
    login_url: Option<&'static str>,
    domains: &'static [&'static str],
    form_type: FormType,
    fields: &'static [(CanonicalKey, &'static str)],
    options: &'static [(CanonicalKey, OptionSet)],
    transforms: &'static [(CanonicalKey, TransformName)],
    verified: bool,
    last_verified: &'static str,
    notes: &'static str,
}

const GENDER: OptionSet = &[("male", "Male"), ("female", "Female")];

const PROVINCES: OptionSet = &[
    ("punjab", "Punjab"),
    ("sindh", "Sindh"),
    ("kpk", "Khyber Pakhtunkhwa"),
    ("balochistan", "Balochistan"),
    ("islamabad", "Islamabad"),
];

const PROVINCES_WITH_TERRITORIES: OptionSet = &[
    ("punjab", "Punjab"),
    ("sindh", "Sindh"),
    ("kpk", "Khyber Pakhtunkhwa"),
    ("balochistan", "Balochistan"),
    ("islamabad", "Islamabad"),
    ("gilgit_baltistan", "Gilgit-Baltistan"),
    ("azad_kashmir", "Azad Jammu & Kashmir"),
];

const PROVINCES_ABBREVIATED: OptionSet = &[
    ("punjab", "Punjab"),
    ("sindh", "Sindh"),
    ("kpk", "KPK"),
    ("balochistan", "Balochistan"),
    ("islamabad", "Islamabad"),
];

const STANDARD_OPTIONS: &[(CanonicalKey, OptionSet)] = &[(Gender, GENDER), (Province, PROVINCES)];

const DMY: &[(CanonicalKey, TransformName)] = &[
    (Cnic, TransformName::CnicDashes),
    (Phone, TransformName::PhonePak),
    (DateOfBirth, TransformName::DateDmy),
];

const YMD: &[(CanonicalKey, TransformName)] = &[
    (Cnic, TransformName::CnicDashes),
    (Phone, TransformName::PhonePak),
    (DateOfBirth, TransformName::DateYmd),
];

const LAST_REVIEWED: &str = "2026-02-21";

const PORTALS: &[PortalSeed] = &[
    PortalSeed {
        slug: "nust",
        name: "NUST",
        registration_url: "https://ugadmissions.nust.edu.pk",
        login_url: Some("https://ugadmissions.nust.edu.pk"),
        domains: &["ugadmissions.nust.edu.pk", "pgadmission.nust.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="applicant_name"], [name="fullName"], #applicant_name, #fullName"#),
            (FatherName, r#"[name="father_name"], [name="fatherName"], #father_name"#),
            (Cnic, r#"[name="cnic"], [name="cnic_no"], #cnic, #cnic_no"#),
            (DateOfBirth, r#"[name="dob"], [name="date_of_birth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="mobile"], [name="phone"], [name="cell"], #mobile, #phone"#),
            (Address, r#"[name="address"], [name="permanent_address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], [name="domicile"], #province"#),
            (PostalCode, r#"[name="postal_code"], [name="zip"], #postal_code"#),
            (FscMarks, r#"[name="fsc_marks"], [name="hssc_marks"], #fsc_marks"#),
            (FscTotal, r#"[name="fsc_total"], [name="hssc_total"], #fsc_total"#),
            (MatricMarks, r#"[name="matric_marks"], [name="ssc_marks"], #matric_marks"#),
            (MatricTotal, r#"[name="matric_total"], [name="ssc_total"], #matric_total"#),
            (BoardName, r#"[name="board"], [name="board_name"], #board"#),
            (PassingYear, r#"[name="passing_year"], [name="year"], #passing_year"#),
            (NetScore, r#"[name="net_score"], [name="test_score"], #net_score"#),
            (DomicileProvince, r#"[name="domicile"], [name="domicile_province"], #domicile"#),
        ],
        options: &[(Gender, GENDER), (Province, PROVINCES_WITH_TERRITORIES)],
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Portal returns 403 to anonymous fetches. Login-first system.",
    },
    PortalSeed {
        slug: "fast",
        name: "FAST-NU",
        registration_url: "https://admissions.nu.edu.pk",
        login_url: Some("https://admissions.nu.edu.pk"),
        domains: &["admissions.nu.edu.pk", "nu.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="applicantName"], [name="fullName"], #name, #applicantName"#),
            (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
            (Cnic, r#"[name="cnic"], [name="cnicNo"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="dateOfBirth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="mobile"], [name="phone"], [name="cellNo"], #mobile, #phone"#),
            (Address, r#"[name="address"], [name="permanentAddress"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="hscMarks"], [name="fscMarks"], #hscMarks"#),
            (FscTotal, r#"[name="hscTotal"], [name="fscTotal"], #hscTotal"#),
            (MatricMarks, r#"[name="sscMarks"], [name="matricMarks"], #sscMarks"#),
            (MatricTotal, r#"[name="sscTotal"], [name="matricTotal"], #sscTotal"#),
            (BoardName, r#"[name="board"], [name="boardName"], #board"#),
            (PassingYear, r#"[name="passingYear"], [name="year"], #passingYear"#),
            (SatScore, r#"[name="satScore"], [name="sat"], #satScore"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: YMD,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "React login portal; values must go through the native setter plus input events.",
    },
    PortalSeed {
        slug: "comsats",
        name: "COMSATS",
        registration_url: "https://admissions.comsats.edu.pk",
        login_url: Some("https://admissions.comsats.edu.pk"),
        domains: &["admissions.comsats.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name*="Name" i], [id*="Name" i], [name*="ApplicantName" i], [name*="Login" i], [id*="Login" i], #Name"#),
            (FatherName, r#"[name*="FatherName" i], [id*="FatherName" i]"#),
            (Cnic, r#"[name*="CNIC" i], [id*="CNIC" i]"#),
            (DateOfBirth, r#"[name*="DOB" i], [id*="DOB" i], [name*="dateofbirth" i]"#),
            (Gender, r#"[name*="Gender" i], [id*="Gender" i]"#),
            (Email, r#"[name*="Email" i], [id*="Email" i], [type="email"]"#),
            (Phone, r#"[name*="Mobile" i], [id*="Mobile" i], [name*="Phone" i], [id*="Phone" i], [name*="ContactNo" i]"#),
            (Address, r#"[name*="Address" i], [id*="Address" i], [name*="PermanentAddress" i]"#),
            (City, r#"[name*="City" i], [id*="City" i]"#),
            (Province, r#"[name*="Province" i], [id*="Province" i]"#),
            (PostalCode, r#"[name*="PostalCode" i], [id*="PostalCode" i]"#),
            (FscMarks, r#"[name*="HSSCMarks" i], [id*="HSSCMarks" i], [name*="FSCMarks" i]"#),
            (FscTotal, r#"[name*="HSSCTotal" i], [id*="HSSCTotal" i], [name*="FSCTotal" i]"#),
            (MatricMarks, r#"[name*="SSCMarks" i], [id*="SSCMarks" i], [name*="MatricMarks" i]"#),
            (MatricTotal, r#"[name*="SSCTotal" i], [id*="SSCTotal" i], [name*="MatricTotal" i]"#),
            (BoardName, r#"[name*="Board" i], [id*="Board" i]"#),
            (PassingYear, r#"[name*="PassingYear" i], [id*="PassingYear" i]"#),
            (DomicileProvince, r#"[name*="Domicile" i], [id*="Domicile" i]"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "ASP.NET style PascalCase field names. Signup has Name, Login, Email, Password.",
    },
    PortalSeed {
        slug: "lums",
        name: "LUMS",
        registration_url: "https://admissions.lums.edu.pk",
        login_url: Some("https://admissions.lums.edu.pk"),
        domains: &["admissions.lums.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FirstName, r#"[name="firstName"], [name="first_name"], [name="fname"], #firstName"#),
            (MiddleName, r#"[name="middleName"], [name="middle_name"], [name="mname"], #middleName"#),
            (LastName, r#"[name="lastName"], [name="last_name"], [name="surname"], [name="lname"], #lastName"#),
            (FullName, r#"[name="fullName"], [name="name"], [name="applicantName"], #fullName"#),
            (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
            (Cnic, r#"[name="cnic"], [name="cnicNo"], [name="nic"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="dateOfBirth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Nationality, r#"[name="nationality"], #nationality"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], [name="contactNo"], #phone"#),
            (Address, r#"[name="address"], [name="permanentAddress"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="hscMarks"], [name="fscMarks"], #hscMarks"#),
            (FscTotal, r#"[name="hscTotal"], [name="fscTotal"], #hscTotal"#),
            (FscPercentage, r#"[name="hscPercentage"], [name="fscPercentage"], #hscPercentage"#),
            (MatricMarks, r#"[name="sscMarks"], [name="matricMarks"], #sscMarks"#),
            (MatricTotal, r#"[name="sscTotal"], [name="matricTotal"], #sscTotal"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passingYear"], #passingYear"#),
            (SatScore, r#"[name="satScore"], [name="sat"], #satScore"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: &[
            (Cnic, TransformName::CnicDashes),
            (Phone, TransformName::PhonePak),
            (DateOfBirth, TransformName::DateYmd),
            (FirstName, TransformName::FirstName),
            (MiddleName, TransformName::MiddleName),
            (LastName, TransformName::LastName),
        ],
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "SAT scores accepted. LCAT scores may need an additional field.",
    },
    PortalSeed {
        slug: "iba",
        name: "IBA",
        registration_url: "https://onlineadmission.iba.edu.pk",
        login_url: Some("https://onlineadmission.iba.edu.pk"),
        domains: &[
            "onlineadmission.iba.edu.pk",
            "admissions.iba.edu.pk",
            "iba.edu.pk",
        ],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="full_name"], [name="name"], [name="applicant_name"], #full_name, #name"#),
            (FatherName, r#"[name="father_name"], [name="fatherName"], #father_name"#),
            (Cnic, r#"[name="cnic"], [name="cnic_no"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="date_of_birth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], [name="contact_no"], #phone, #mobile"#),
            (Address, r#"[name="address"], [name="permanent_address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="hssc_marks"], [name="fsc_marks"], #hssc_marks"#),
            (FscTotal, r#"[name="hssc_total"], [name="fsc_total"], #hssc_total"#),
            (MatricMarks, r#"[name="ssc_marks"], [name="matric_marks"], #ssc_marks"#),
            (MatricTotal, r#"[name="ssc_total"], [name="matric_total"], #ssc_total"#),
            (BoardName, r#"[name="board"], [name="board_name"], #board"#),
            (PassingYear, r#"[name="passing_year"], #passing_year"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Apply Online links to onlineadmission.iba.edu.pk.",
    },
    PortalSeed {
        slug: "giki",
        name: "GIKI",
        registration_url: "https://giki.edu.pk/admissions",
        login_url: None,
        domains: &["giki.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="full_name"], [name="applicant_name"], #name"#),
            (FatherName, r#"[name="father_name"], [name="fatherName"], #father_name"#),
            (Cnic, r#"[name="cnic"], [name="cnic_no"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="date_of_birth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], #phone"#),
            (Address, r#"[name="address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="fsc_marks"], [name="hssc_marks"], #fsc_marks"#),
            (FscTotal, r#"[name="fsc_total"], [name="hssc_total"], #fsc_total"#),
            (MatricMarks, r#"[name="matric_marks"], [name="ssc_marks"], #matric_marks"#),
            (MatricTotal, r#"[name="matric_total"], [name="ssc_total"], #matric_total"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passing_year"], #passing_year"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Info page; the application form moves to a separate portal during the season.",
    },
    PortalSeed {
        slug: "pieas",
        name: "PIEAS",
        registration_url: "https://red.pieas.edu.pk/pieasadmission/lgn.aspx",
        login_url: Some("https://red.pieas.edu.pk/pieasadmission/lgn.aspx"),
        domains: &["red.pieas.edu.pk", "pieas.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name$="txtName"], [name$="txtFullName"], [id$="txtName"]"#),
            (FatherName, r#"[name$="txtFatherName"], [id$="txtFatherName"]"#),
            (Cnic, r#"#txtRegNo, [name$="txtCNIC"], [name$="txtCnic"], [id$="txtCNIC"]"#),
            (DateOfBirth, r#"[name$="txtDOB"], [id$="txtDOB"]"#),
            (Gender, r#"[name$="ddlGender"], [id$="ddlGender"]"#),
            (Email, r#"[name$="txtEmail"], [id$="txtEmail"], [type="email"]"#),
            (Phone, r#"[name$="txtMobile"], [name$="txtPhone"], [id$="txtMobile"]"#),
            (Address, r#"[name$="txtAddress"], [id$="txtAddress"]"#),
            (City, r#"[name$="txtCity"], [name$="ddlCity"], [id$="txtCity"]"#),
            (Province, r#"[name$="ddlProvince"], [id$="ddlProvince"]"#),
            (FscMarks, r#"[name$="txtFSCMarks"], [name$="txtHSSCMarks"], [id$="txtFSCMarks"]"#),
            (FscTotal, r#"[name$="txtFSCTotal"], [id$="txtFSCTotal"]"#),
            (MatricMarks, r#"[name$="txtSSCMarks"], [name$="txtMatricMarks"], [id$="txtSSCMarks"]"#),
            (MatricTotal, r#"[name$="txtSSCTotal"], [id$="txtSSCTotal"]"#),
            (BoardName, r#"[name$="ddlBoard"], [id$="ddlBoard"]"#),
            (PassingYear, r#"[name$="txtPassingYear"], [name$="ddlPassingYear"], [id$="txtPassingYear"]"#),
            (DomicileProvince, r#"[name$="ddlDomicile"], [id$="ddlDomicile"]"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "ASP.NET WebForms; suffix selectors absorb generated control prefixes.",
    },
    PortalSeed {
        slug: "ned",
        name: "NED",
        registration_url: "https://www.neduet.edu.pk/admission",
        login_url: None,
        domains: &["neduet.edu.pk", "admission.neduet.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="full_name"], [name="applicant_name"], #name"#),
            (FatherName, r#"[name="father_name"], [name="fatherName"], #father_name"#),
            (Cnic, r#"[name="cnic"], [name="cnic_no"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="date_of_birth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], [name="contact"], #phone"#),
            (Address, r#"[name="address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="hssc_marks"], [name="fsc_marks"], #hssc_marks"#),
            (FscTotal, r#"[name="hssc_total"], [name="fsc_total"], #hssc_total"#),
            (MatricMarks, r#"[name="ssc_marks"], [name="matric_marks"], #ssc_marks"#),
            (MatricTotal, r#"[name="ssc_total"], [name="matric_total"], #ssc_total"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passing_year"], #passing_year"#),
            (EcatScore, r#"[name="ecat_score"], [name="test_score"], #ecat_score"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Portal opens in April. NED runs its own entry test.",
    },
    PortalSeed {
        slug: "habib",
        name: "Habib University",
        registration_url: "https://eapplication.habib.edu.pk/Description.html",
        login_url: Some("https://eapplication.habib.edu.pk"),
        domains: &["eapplication.habib.edu.pk", "habib.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="fullName"], [name="applicant_name"], #name"#),
            (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
            (Cnic, r#"[name="cnic"], [name="cnicNo"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="dateOfBirth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], #phone"#),
            (Address, r#"[name="address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="hscMarks"], [name="fscMarks"], #hscMarks"#),
            (FscTotal, r#"[name="hscTotal"], #hscTotal"#),
            (MatricMarks, r#"[name="sscMarks"], [name="matricMarks"], #sscMarks"#),
            (MatricTotal, r#"[name="sscTotal"], #sscTotal"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passingYear"], #passingYear"#),
            (SatScore, r#"[name="satScore"], #satScore"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: YMD,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Create Account lives at /Description.html. Application fee 7500 PKR.",
    },
    PortalSeed {
        slug: "aku",
        name: "AKU",
        registration_url: "https://www.aku.edu/admissions",
        login_url: None,
        domains: &["aku.edu", "www.aku.edu", "akuross.aku.edu"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="fullName"], [name="applicantName"], #name"#),
            (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
            (Cnic, r#"[name="cnic"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="dateOfBirth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], #phone"#),
            (Address, r#"[name="address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="hscMarks"], [name="fscMarks"], #hscMarks"#),
            (FscTotal, r#"[name="hscTotal"], #hscTotal"#),
            (MatricMarks, r#"[name="sscMarks"], #sscMarks"#),
            (MatricTotal, r#"[name="sscTotal"], #sscTotal"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passingYear"], #passingYear"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: YMD,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "SharePoint site; the application itself may run on PeopleSoft.",
    },
    PortalSeed {
        slug: "airuni",
        name: "Air University",
        registration_url: "https://portals.au.edu.pk/admissions/Accounts/SignUp",
        login_url: Some("https://portals.au.edu.pk/admissions"),
        domains: &["portals.au.edu.pk", "au.edu.pk", "webdata.au.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="FullName"], [name="Name"], [name="ApplicantName"], #FullName, #Name"#),
            (FatherName, r#"[name="FatherName"], [name="Father_Name"], #FatherName"#),
            (Cnic, r#"[name="CNIC"], [name="Cnic"], #CNIC"#),
            (DateOfBirth, r#"[name="DOB"], [name="DateOfBirth"], #DOB"#),
            (Gender, r#"[name="Gender"], #Gender"#),
            (Email, r#"[name="Email"], [type="email"], #Email"#),
            (Phone, r#"[name="Phone"], [name="Mobile"], [name="ContactNo"], #Phone, #Mobile"#),
            (Address, r#"[name="Address"], [name="PermanentAddress"], #Address"#),
            (City, r#"[name="City"], #City"#),
            (Province, r#"[name="Province"], #Province"#),
            (PostalCode, r#"[name="PostalCode"], #PostalCode"#),
            (FscMarks, r#"[name="FSCMarks"], [name="HSSCMarks"], #FSCMarks"#),
            (FscTotal, r#"[name="FSCTotal"], [name="HSSCTotal"], #FSCTotal"#),
            (MatricMarks, r#"[name="MatricMarks"], [name="SSCMarks"], #MatricMarks"#),
            (MatricTotal, r#"[name="MatricTotal"], [name="SSCTotal"], #MatricTotal"#),
            (BoardName, r#"[name="Board"], [name="BoardName"], #Board"#),
            (PassingYear, r#"[name="PassingYear"], #PassingYear"#),
            (DomicileProvince, r#"[name="Domicile"], #Domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "ASP.NET MVC. Requires academic certificates, CNIC and father's CNIC.",
    },
    PortalSeed {
        slug: "szabist-isb",
        name: "SZABIST Islamabad",
        registration_url: "https://admissions.szabist-isb.edu.pk",
        login_url: Some("https://admissions.szabist-isb.edu.pk"),
        domains: &["admissions.szabist-isb.edu.pk", "szabist-isb.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: SZABIST_FIELDS,
        options: &[(Gender, GENDER), (Province, PROVINCES_ABBREVIATED)],
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Spring 2026 admissions open.",
    },
    PortalSeed {
        slug: "szabist-khi",
        name: "SZABIST Karachi",
        registration_url: "https://admissions.szabist.edu.pk",
        login_url: Some("https://admissions.szabist.edu.pk"),
        domains: &["admissions.szabist.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: SZABIST_FIELDS,
        options: &[(Gender, GENDER), (Province, PROVINCES_ABBREVIATED)],
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Same system as the Islamabad campus.",
    },
    PortalSeed {
        slug: "itu",
        name: "ITU",
        registration_url: "https://itu.edu.pk/admissions",
        login_url: None,
        domains: &["itu.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="fullName"], [name="applicantName"], #name"#),
            (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
            (Cnic, r#"[name="cnic"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], #phone"#),
            (Address, r#"[name="address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="fscMarks"], [name="hscMarks"], #fscMarks"#),
            (FscTotal, r#"[name="fscTotal"], #fscTotal"#),
            (MatricMarks, r#"[name="sscMarks"], [name="matricMarks"], #sscMarks"#),
            (MatricTotal, r#"[name="sscTotal"], #sscTotal"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passingYear"], #passingYear"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: YMD,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Application portal opens during the admissions season.",
    },
    PortalSeed {
        slug: "bahria",
        name: "Bahria University",
        registration_url: "https://www.bahria.edu.pk/admissions",
        login_url: None,
        domains: &["bahria.edu.pk", "www.bahria.edu.pk", "cms.bahria.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="fullName"], [name="ApplicantName"], #name"#),
            (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
            (Cnic, r#"[name="cnic"], [name="CNIC"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="DOB"], #dob"#),
            (Gender, r#"[name="gender"], [name="Gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], #phone"#),
            (Address, r#"[name="address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="fscMarks"], [name="hscMarks"], #fscMarks"#),
            (FscTotal, r#"[name="fscTotal"], #fscTotal"#),
            (MatricMarks, r#"[name="sscMarks"], [name="matricMarks"], #sscMarks"#),
            (MatricTotal, r#"[name="sscTotal"], #sscTotal"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passingYear"], #passingYear"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Multiple campuses; the CMS portal sits on cms.bahria.edu.pk.",
    },
    PortalSeed {
        slug: "uet-lahore",
        name: "UET Lahore",
        registration_url: "https://admission.uet.edu.pk",
        login_url: Some("https://admission.uet.edu.pk"),
        domains: &["admission.uet.edu.pk", "uet.edu.pk"],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="full_name"], [name="applicant_name"], #name, #applicant_name"#),
            (FatherName, r#"[name="father_name"], [name="fatherName"], #father_name"#),
            (Cnic, r#"[name="cnic"], [name="cnic_no"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="date_of_birth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], [name="cell_no"], #phone, #mobile"#),
            (Address, r#"[name="address"], [name="permanent_address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (PostalCode, r#"[name="postal_code"], #postal_code"#),
            (FscMarks, r#"[name="fsc_marks"], [name="hssc_marks"], #fsc_marks"#),
            (FscTotal, r#"[name="fsc_total"], [name="hssc_total"], #fsc_total"#),
            (MatricMarks, r#"[name="matric_marks"], [name="ssc_marks"], #matric_marks"#),
            (MatricTotal, r#"[name="matric_total"], [name="ssc_total"], #matric_total"#),
            (BoardName, r#"[name="board"], [name="board_name"], #board"#),
            (PassingYear, r#"[name="passing_year"], #passing_year"#),
            (EcatScore, r#"[name="ecat_score"], [name="test_score"], #ecat_score"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Includes ECAT registration.",
    },
    PortalSeed {
        slug: "uet-taxila",
        name: "UET Taxila",
        registration_url: "https://admission.uettaxila.edu.pk",
        login_url: Some("https://admission.uettaxila.edu.pk"),
        domains: &[
            "admissions.uettaxila.edu.pk",
            "admission.uettaxila.edu.pk",
            "uettaxila.edu.pk",
        ],
        form_type: FormType::RequiresLoginFirst,
        fields: &[
            (FullName, r#"[name="name"], [name="full_name"], [name="applicant_name"], #name"#),
            (FatherName, r#"[name="father_name"], [name="fatherName"], #father_name"#),
            (Cnic, r#"[name="cnic"], [name="cnic_no"], #cnic"#),
            (DateOfBirth, r#"[name="dob"], [name="date_of_birth"], #dob"#),
            (Gender, r#"[name="gender"], #gender"#),
            (Email, r#"[name="email"], [type="email"], #email"#),
            (Phone, r#"[name="phone"], [name="mobile"], [name="cell_no"], #phone"#),
            (Address, r#"[name="address"], [name="permanent_address"], #address"#),
            (City, r#"[name="city"], #city"#),
            (Province, r#"[name="province"], #province"#),
            (FscMarks, r#"[name="fsc_marks"], [name="hssc_marks"], #fsc_marks"#),
            (FscTotal, r#"[name="fsc_total"], [name="hssc_total"], #fsc_total"#),
            (MatricMarks, r#"[name="matric_marks"], [name="ssc_marks"], #matric_marks"#),
            (MatricTotal, r#"[name="matric_total"], [name="ssc_total"], #matric_total"#),
            (BoardName, r#"[name="board"], #board"#),
            (PassingYear, r#"[name="passing_year"], #passing_year"#),
            (EcatScore, r#"[name="ecat_score"], [name="test_score"], #ecat_score"#),
            (DomicileProvince, r#"[name="domicile"], #domicile"#),
        ],
        options: STANDARD_OPTIONS,
        transforms: DMY,
        verified: false,
        last_verified: LAST_REVIEWED,
        notes: "Separate from UET Lahore with a similar portal structure.",
    },
];

const SZABIST_FIELDS: &[(CanonicalKey, &str)] = &[
    (FullName, r#"[name="name"], [name="fullName"], [name="ApplicantName"], #name"#),
    (FatherName, r#"[name="fatherName"], [name="father_name"], #fatherName"#),
    (Cnic, r#"[name="cnic"], [name="CNIC"], #cnic"#),
    (DateOfBirth, r#"[name="dob"], [name="DOB"], #dob"#),
    (Gender, r#"[name="gender"], [name="Gender"], #gender"#),
    (Email, r#"[name="email"], [type="email"], #email"#),
    (Phone, r#"[name="phone"], [name="mobile"], #phone"#),
    (Address, r#"[name="address"], #address"#),
    (City, r#"[name="city"], #city"#),
    (Province, r#"[name="province"], #province"#),
    (FscMarks, r#"[name="fscMarks"], [name="hscMarks"], #fscMarks"#),
    (FscTotal, r#"[name="fscTotal"], #fscTotal"#),
    (MatricMarks, r#"[name="sscMarks"], [name="matricMarks"], #sscMarks"#),
    (MatricTotal, r#"[name="sscTotal"], #sscTotal"#),
    (BoardName, r#"[name="board"], #board"#),
    (PassingYear, r#"[name="passingYear"], #passingYear"#),
    (DomicileProvince, r#"[name="domicile"], #domicile"#),
];

pub(super) fn builtin_profiles() -> Result<Vec<PortalProfile>, RegistryError> {
    PORTALS.iter().map(PortalSeed::build).collect()
}

impl PortalSeed {
    fn build(&self) -> Result<PortalProfile, RegistryError> {
        let last_verified = NaiveDate::parse_from_str(self.last_verified, "%Y-%m-%d").map_err(
            |_| RegistryError::InvalidDate {
                slug: self.slug.to_string(),
                value: self.last_verified.to_string(),
            },
        )?;

        Ok(PortalProfile {
            slug: self.slug.to_string(),
            display_name: self.name.to_string(),
            domains: self.domains.iter().map(|domain| domain.to_string()).collect(),
            form_type: self.form_type,
            registration_url: self.registration_url.to_string(),
            login_url: self.login_url.map(str::to_string),
            field_map: self
                .fields
                .iter()
                .map(|(key, group)| FieldBinding {
                    key: *key,
                    selectors: SelectorChain::parse(group),
                })
                .collect(),
            select_options: self
                .options
                .iter()
                .map(|(key, pairs)| {
                    let labels = pairs
                        .iter()
                        .map(|(value, label)| (value.to_string(), label.to_string()))
                        .collect();
                    (*key, labels)
                })
                .collect(),
            transforms: self.transforms.iter().copied().collect(),
            verified: self.verified,
            last_verified: Some(last_verified),
            notes: self.notes.to_string(),
        })
    }
}
